mod historico;
mod pendencia;
mod roteiro;

pub use historico::{EntradaHistorico, Historico, rotulo};
pub use pendencia::{
    Pendencia, PendenciaId, Prioridade, RoteiroId, SetorId, Situacao, StatusTransferencia,
    UsuarioId,
};
pub use roteiro::{
    Alvo, Passo, PassoNormalizado, Roteiro, RoteiroDraft, RoteiroInvalido, RoteiroPayload,
    TipoPasso,
};
