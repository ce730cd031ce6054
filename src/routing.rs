//! Avaliação das regras de roteamento de uma pendência.
//!
//! Dada uma pendência e, se houver, o roteiro que ela referencia, decide
//! para onde ela pode ser transferida. A avaliação é pura: não toca no
//! backend nem altera a pendência.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Alvo, Pendencia, PassoNormalizado, Roteiro, RoteiroId, SetorId, UsuarioId};

/// Os quatro estados possíveis de uma decisão de roteamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingState {
    /// Sem roteiro: qualquer setor ou usuário é destino válido.
    Unrestricted,
    /// Roteiro referenciado mas não aplicável; tratado como livre, com aviso.
    Untracked,
    /// Pendência no último passo do roteiro; nenhuma transferência permitida.
    Exhausted,
    /// Apenas o passo seguinte do roteiro é destino válido.
    Restricted,
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingState::Unrestricted => write!(f, "UNRESTRICTED"),
            RoutingState::Untracked => write!(f, "UNTRACKED"),
            RoutingState::Exhausted => write!(f, "EXHAUSTED"),
            RoutingState::Restricted => write!(f, "RESTRICTED"),
        }
    }
}

/// Por que uma pendência com roteiro não pôde ser posicionada nele.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "motivo", rename_all = "snake_case")]
pub enum UntrackedReason {
    /// O roteiro referenciado não existe mais (ou não foi encontrado).
    RoteiroNaoEncontrado { id_roteiro: RoteiroId },
    /// O detentor atual não corresponde a nenhum passo do roteiro.
    DetentorForaDoRoteiro {
        id_setor: Option<SetorId>,
        id_usuario: Option<UsuarioId>,
    },
}

impl fmt::Display for UntrackedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UntrackedReason::RoteiroNaoEncontrado { id_roteiro } => {
                write!(f, "roteiro #{id_roteiro} não encontrado")
            }
            UntrackedReason::DetentorForaDoRoteiro { .. } => {
                write!(f, "detentor atual não corresponde a nenhum passo do roteiro")
            }
        }
    }
}

/// Resultado da avaliação de roteamento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RoutingDecision {
    Unrestricted,
    Untracked { reason: UntrackedReason },
    /// `posicao` é o índice (base zero) do passo atual na sequência normalizada.
    Exhausted { posicao: usize },
    Restricted { posicao: usize, proximo: Alvo },
}

impl RoutingDecision {
    pub fn state(&self) -> RoutingState {
        match self {
            RoutingDecision::Unrestricted => RoutingState::Unrestricted,
            RoutingDecision::Untracked { .. } => RoutingState::Untracked,
            RoutingDecision::Exhausted { .. } => RoutingState::Exhausted,
            RoutingDecision::Restricted { .. } => RoutingState::Restricted,
        }
    }

    /// Único destino permitido, quando o roteiro restringe a transferência.
    pub fn proximo(&self) -> Option<Alvo> {
        match self {
            RoutingDecision::Restricted { proximo, .. } => Some(*proximo),
            _ => None,
        }
    }

    pub fn valid_setor_id(&self) -> Option<SetorId> {
        self.proximo().and_then(|a| a.id_setor())
    }

    pub fn valid_usuario_id(&self) -> Option<UsuarioId> {
        self.proximo().and_then(|a| a.id_usuario())
    }

    /// Aviso não fatal a mostrar quando o roteiro não pôde ser aplicado.
    pub fn warning(&self) -> Option<String> {
        match self {
            RoutingDecision::Untracked { reason } => Some(reason.to_string()),
            _ => None,
        }
    }

    /// Qualquer destino é aceito (sem roteiro ou roteiro não rastreado).
    pub fn is_free(&self) -> bool {
        matches!(
            self,
            RoutingDecision::Unrestricted | RoutingDecision::Untracked { .. }
        )
    }

    pub fn view(&self) -> RoutingView {
        RoutingView {
            state: self.state(),
            valid_setor_id: self.valid_setor_id(),
            valid_usuario_id: self.valid_usuario_id(),
            warning: self.warning(),
        }
    }
}

/// Forma achatada da decisão, exposta à camada de apresentação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingView {
    pub state: RoutingState,
    #[serde(rename = "validSectorId", skip_serializing_if = "Option::is_none")]
    pub valid_setor_id: Option<SetorId>,
    #[serde(rename = "validUserId", skip_serializing_if = "Option::is_none")]
    pub valid_usuario_id: Option<UsuarioId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Avalia a decisão de roteamento para `pendencia`.
///
/// `roteiro` deve ser o roteiro referenciado por `pendencia.id_roteiro`, ou
/// `None` se não houver referência ou se ele não foi encontrado.
///
/// - Sem `id_roteiro`: [`RoutingDecision::Unrestricted`].
/// - Roteiro ausente (ou de outro id): [`RoutingDecision::Untracked`].
/// - Posição localizada pelo usuário atual num passo de usuário; se não
///   houver, pelo setor atual num passo de setor; se nenhum casar, `Untracked`.
/// - No último passo: [`RoutingDecision::Exhausted`]; senão o passo seguinte
///   é o único destino ([`RoutingDecision::Restricted`]).
pub fn evaluate_routing(pendencia: &Pendencia, roteiro: Option<&Roteiro>) -> RoutingDecision {
    let Some(id_roteiro) = pendencia.id_roteiro else {
        return RoutingDecision::Unrestricted;
    };

    let roteiro = match roteiro {
        Some(r) if r.id == id_roteiro => r,
        _ => {
            warn!(pendencia = pendencia.id, id_roteiro, "roteiro da pendência não encontrado");
            return RoutingDecision::Untracked {
                reason: UntrackedReason::RoteiroNaoEncontrado { id_roteiro },
            };
        }
    };

    let passos = roteiro.passos_normalizados();
    if !roteiro.bem_formado() {
        debug!(
            id_roteiro,
            recebidos = roteiro.passos.len(),
            validos = passos.len(),
            "ordem dos passos normalizada"
        );
    }

    let Some(posicao) = localizar_posicao(&passos, pendencia.id_usuario, pendencia.id_setor) else {
        warn!(
            pendencia = pendencia.id,
            id_roteiro,
            id_setor = ?pendencia.id_setor,
            id_usuario = ?pendencia.id_usuario,
            "detentor fora do roteiro"
        );
        return RoutingDecision::Untracked {
            reason: UntrackedReason::DetentorForaDoRoteiro {
                id_setor: pendencia.id_setor,
                id_usuario: pendencia.id_usuario,
            },
        };
    };

    match passos.get(posicao + 1) {
        Some(proximo) => RoutingDecision::Restricted {
            posicao,
            proximo: proximo.alvo,
        },
        None => RoutingDecision::Exhausted { posicao },
    }
}

/// Índice do passo correspondente ao detentor atual.
///
/// O usuário é o sinal mais específico: um detentor usuário só casa com
/// passos de usuário e tem precedência sobre o setor, mesmo quando o setor
/// atual também aparece no roteiro.
pub fn localizar_posicao(
    passos: &[PassoNormalizado],
    id_usuario: Option<UsuarioId>,
    id_setor: Option<SetorId>,
) -> Option<usize> {
    let por_usuario = id_usuario
        .and_then(|u| passos.iter().position(|p| p.alvo == Alvo::Usuario(u)));
    por_usuario.or_else(|| {
        id_setor.and_then(|s| passos.iter().position(|p| p.alvo == Alvo::Setor(s)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Passo;

    const SETOR_A: SetorId = 10;
    const USUARIO_U: UsuarioId = 20;
    const SETOR_B: SetorId = 30;

    fn roteiro(id: RoteiroId, passos: Vec<Passo>) -> Roteiro {
        Roteiro {
            id,
            nome: "Atendimento".into(),
            descricao: None,
            ativo: true,
            data_criacao: None,
            passos,
        }
    }

    fn roteiro_abu() -> Roteiro {
        roteiro(
            7,
            vec![
                Passo::setor(1, SETOR_A),
                Passo::usuario(2, USUARIO_U),
                Passo::setor(3, SETOR_B),
            ],
        )
    }

    fn pendencia(id_roteiro: Option<RoteiroId>, setor: Option<SetorId>, usuario: Option<UsuarioId>) -> Pendencia {
        Pendencia {
            id: 1,
            id_roteiro,
            id_setor: setor,
            id_usuario: usuario,
            ..Default::default()
        }
    }

    #[test]
    fn no_roteiro_is_unrestricted() {
        let p = pendencia(None, Some(SETOR_A), Some(5));
        assert_eq!(evaluate_routing(&p, None), RoutingDecision::Unrestricted);
        // Um roteiro passado por engano não muda nada sem id_roteiro.
        assert_eq!(
            evaluate_routing(&p, Some(&roteiro_abu())),
            RoutingDecision::Unrestricted
        );
    }

    #[test]
    fn missing_roteiro_is_untracked_with_warning() {
        let p = pendencia(Some(7), Some(SETOR_A), None);
        let d = evaluate_routing(&p, None);
        assert_eq!(d.state(), RoutingState::Untracked);
        assert!(d.is_free());
        assert_eq!(d.warning().unwrap(), "roteiro #7 não encontrado");
    }

    #[test]
    fn roteiro_with_other_id_is_treated_as_missing() {
        let p = pendencia(Some(99), Some(SETOR_A), None);
        let d = evaluate_routing(&p, Some(&roteiro_abu()));
        assert_eq!(
            d,
            RoutingDecision::Untracked {
                reason: UntrackedReason::RoteiroNaoEncontrado { id_roteiro: 99 }
            }
        );
    }

    #[test]
    fn sector_a_then_user_u() {
        let d = evaluate_routing(&pendencia(Some(7), Some(SETOR_A), None), Some(&roteiro_abu()));
        assert_eq!(d.state(), RoutingState::Restricted);
        assert_eq!(d.valid_usuario_id(), Some(USUARIO_U));
        assert_eq!(d.valid_setor_id(), None);
    }

    #[test]
    fn user_u_then_sector_b() {
        // O usuário U pertence ao setor A; o usuário tem precedência.
        let d = evaluate_routing(
            &pendencia(Some(7), Some(SETOR_A), Some(USUARIO_U)),
            Some(&roteiro_abu()),
        );
        assert_eq!(
            d,
            RoutingDecision::Restricted {
                posicao: 1,
                proximo: Alvo::Setor(SETOR_B)
            }
        );
    }

    #[test]
    fn sector_b_is_exhausted() {
        let d = evaluate_routing(&pendencia(Some(7), Some(SETOR_B), None), Some(&roteiro_abu()));
        assert_eq!(d, RoutingDecision::Exhausted { posicao: 2 });
        assert_eq!(d.proximo(), None);
        assert!(!d.is_free());
    }

    #[test]
    fn every_position_yields_next_step_or_exhausted() {
        let passos: Vec<Passo> = (1..=6)
            .map(|i| {
                if i % 2 == 0 {
                    Passo::usuario(i, 100 + i)
                } else {
                    Passo::setor(i, 200 + i)
                }
            })
            .collect();
        let r = roteiro(3, passos.clone());
        let n = passos.len();
        for (i, passo) in passos.iter().enumerate() {
            let p = pendencia(Some(3), passo.id_setor, passo.id_usuario);
            let d = evaluate_routing(&p, Some(&r));
            if i < n - 1 {
                assert_eq!(d.proximo(), passos[i + 1].alvo(), "posição {i}");
            } else {
                assert_eq!(d.state(), RoutingState::Exhausted);
            }
        }
    }

    #[test]
    fn user_holder_not_in_roteiro_falls_back_to_sector() {
        let d = evaluate_routing(&pendencia(Some(7), Some(SETOR_A), Some(555)), Some(&roteiro_abu()));
        assert_eq!(d.valid_usuario_id(), Some(USUARIO_U));
    }

    #[test]
    fn user_holder_never_matches_sector_step_with_same_id() {
        // Usuário 30 e setor 30 coexistem; o usuário não pode casar com o passo de setor 30.
        let d = evaluate_routing(&pendencia(Some(7), None, Some(SETOR_B)), Some(&roteiro_abu()));
        assert_eq!(d.state(), RoutingState::Untracked);
    }

    #[test]
    fn holder_outside_roteiro_is_untracked() {
        let d = evaluate_routing(&pendencia(Some(7), Some(77), None), Some(&roteiro_abu()));
        assert_eq!(
            d,
            RoutingDecision::Untracked {
                reason: UntrackedReason::DetentorForaDoRoteiro {
                    id_setor: Some(77),
                    id_usuario: None
                }
            }
        );
    }

    #[test]
    fn empty_roteiro_is_untracked() {
        let d = evaluate_routing(&pendencia(Some(1), Some(SETOR_A), None), Some(&roteiro(1, vec![])));
        assert_eq!(d.state(), RoutingState::Untracked);
    }

    #[test]
    fn malformed_orders_are_sorted_and_deduplicated() {
        let r = roteiro(
            5,
            vec![
                Passo::setor(3, SETOR_B),
                Passo::setor(1, SETOR_A),
                Passo::setor(1, 999),
                Passo::usuario(2, USUARIO_U),
            ],
        );
        let d = evaluate_routing(&pendencia(Some(5), Some(SETOR_A), None), Some(&r));
        assert_eq!(d.valid_usuario_id(), Some(USUARIO_U));
        // O passo duplicado descartado não posiciona a pendência.
        let d = evaluate_routing(&pendencia(Some(5), Some(999), None), Some(&r));
        assert_eq!(d.state(), RoutingState::Untracked);
    }

    #[test]
    fn decision_serializes_with_state_tag() {
        let d = RoutingDecision::Restricted {
            posicao: 0,
            proximo: Alvo::Usuario(4),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["state"], "restricted");
        assert_eq!(json["proximo"]["Usuario"], 4);
    }

    #[test]
    fn view_flattens_next_target() {
        let d = RoutingDecision::Restricted {
            posicao: 0,
            proximo: Alvo::Usuario(4),
        };
        assert_eq!(
            serde_json::to_value(d.view()).unwrap(),
            serde_json::json!({"state": "restricted", "validUserId": 4})
        );

        let d = RoutingDecision::Restricted {
            posicao: 1,
            proximo: Alvo::Setor(SETOR_B),
        };
        assert_eq!(
            serde_json::to_value(d.view()).unwrap(),
            serde_json::json!({"state": "restricted", "validSectorId": SETOR_B})
        );

        assert_eq!(
            serde_json::to_value(RoutingDecision::Exhausted { posicao: 2 }.view()).unwrap(),
            serde_json::json!({"state": "exhausted"})
        );
    }

    #[test]
    fn untracked_view_carries_warning() {
        let d = evaluate_routing(&pendencia(Some(3), Some(SETOR_A), None), None);
        let json = serde_json::to_value(d.view()).unwrap();
        assert_eq!(json["state"], "untracked");
        assert_eq!(json["warning"], "roteiro #3 não encontrado");
    }

    #[test]
    fn duplicate_order_after_missing_target_is_not_promoted() {
        let mut sem_alvo = Passo::setor(2, SETOR_B);
        sem_alvo.id_setor = None;
        let r = roteiro(5, vec![Passo::setor(1, SETOR_A), sem_alvo, Passo::setor(2, 60)]);
        let d = evaluate_routing(&pendencia(Some(5), Some(SETOR_A), None), Some(&r));
        assert_eq!(d, RoutingDecision::Exhausted { posicao: 0 });
    }

    #[test]
    fn state_display() {
        assert_eq!(RoutingState::Unrestricted.to_string(), "UNRESTRICTED");
        assert_eq!(RoutingState::Exhausted.to_string(), "EXHAUSTED");
    }
}
