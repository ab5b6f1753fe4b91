// src/models/lifecycle.rs

use crate::common::error::AppError;

/// Transição pedida sobre um documento de fluxo (compra, romaneio, devolução).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// concluir / finalizar / processar
    Complete,
    Cancel,
    /// edição de campos; não muda o status, mas exige o estado aberto
    Edit,
}

/// Máquina de estados compartilhada pelos três fluxos:
///
/// ```text
/// aberto --(Complete)--> concluído   [terminal]
/// aberto --(Cancel)----> cancelado   [terminal]
/// ```
///
/// Toda regra de "só pode X quando está Y" passa por `apply`; os serviços
/// não comparam status diretamente.
pub trait Lifecycle: Copy + Eq + std::fmt::Debug {
    const OPEN: Self;
    const COMPLETED: Self;
    const CANCELLED: Self;

    /// Mensagem de erro quando a transição é pedida fora do estado aberto.
    fn rejection(transition: Transition) -> &'static str;

    fn apply(self, transition: Transition) -> Result<Self, AppError> {
        if self != Self::OPEN {
            return Err(AppError::business(Self::rejection(transition)));
        }
        Ok(match transition {
            Transition::Complete => Self::COMPLETED,
            Transition::Cancel => Self::CANCELLED,
            Transition::Edit => Self::OPEN,
        })
    }

    fn is_terminal(self) -> bool {
        self != Self::OPEN
    }

    /// Resultado do UPDATE condicional: `None` significa que o status mudou
    /// entre a leitura e a escrita (chamada concorrente).
    fn confirm<T>(row: Option<T>, transition: Transition) -> Result<T, AppError> {
        row.ok_or_else(|| AppError::business(Self::rejection(transition)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compras::CompraStatus;
    use crate::models::devolucoes::DevolucaoStatus;
    use crate::models::romaneios::RomaneioStatus;

    fn assert_closed<S: Lifecycle>() {
        // do estado aberto, cada transição é aceita uma vez
        let done = S::OPEN.apply(Transition::Complete).unwrap();
        assert_eq!(done, S::COMPLETED);
        let cancelled = S::OPEN.apply(Transition::Cancel).unwrap();
        assert_eq!(cancelled, S::CANCELLED);
        assert_eq!(S::OPEN.apply(Transition::Edit).unwrap(), S::OPEN);

        // e nenhuma sai de um estado terminal
        for terminal in [S::COMPLETED, S::CANCELLED] {
            assert!(terminal.is_terminal());
            for t in [Transition::Complete, Transition::Cancel, Transition::Edit] {
                let err = terminal.apply(t).unwrap_err();
                assert!(matches!(err, AppError::BusinessRule(_)), "{:?} -> {:?}", terminal, t);
            }
        }
    }

    #[test]
    fn purchase_lifecycle_is_closed() {
        assert_closed::<CompraStatus>();
    }

    #[test]
    fn manifest_lifecycle_is_closed() {
        assert_closed::<RomaneioStatus>();
    }

    #[test]
    fn return_lifecycle_is_closed() {
        assert_closed::<DevolucaoStatus>();
    }

    #[test]
    fn lost_race_is_reported_as_the_same_rejection() {
        let err = CompraStatus::confirm::<()>(None, Transition::Cancel).unwrap_err();
        assert_eq!(err.to_string(), "Apenas compras pendentes podem ser canceladas");
        assert_eq!(CompraStatus::confirm(Some(7), Transition::Cancel).unwrap(), 7);
    }

    #[test]
    fn rejection_names_the_operation() {
        let err = CompraStatus::Concluida.apply(Transition::Complete).unwrap_err();
        assert_eq!(err.to_string(), "Apenas compras pendentes podem ser concluídas");
        let err = RomaneioStatus::Finalizado.apply(Transition::Complete).unwrap_err();
        assert_eq!(err.to_string(), "Apenas romaneios em rascunho podem ser finalizados");
    }
}
