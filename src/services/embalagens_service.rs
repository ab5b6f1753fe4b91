// src/services/embalagens_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{cadastros_repo::Cadastro, CadastrosRepository, EmbalagensRepository},
    models::embalagens::{
        AjustePayload, AjusteResultado, EmbalagemMovimento, EmbalagemSaldo, MovimentoFilters,
        NovoMovimento, SaldoFilters,
    },
};

#[derive(Clone)]
pub struct EmbalagensService {
    repo: EmbalagensRepository,
    cadastros: CadastrosRepository,
}

impl EmbalagensService {
    pub fn new(repo: EmbalagensRepository, cadastros: CadastrosRepository) -> Self {
        Self { repo, cadastros }
    }

    /// Rotina única de saldo: normaliza o sinal, soma no saldo (upsert atômico)
    /// e grava o movimento. Usada pelo ajuste manual e pelo fechamento de romaneio.
    pub async fn aplicar_movimento<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        movimento: &NovoMovimento,
    ) -> Result<AjusteResultado, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let delta = movimento.delta()?;

        let mut tx = executor.begin().await?;

        let saldo = self
            .repo
            .upsert_saldo(&mut *tx, tenant_id, movimento.loja_id, movimento.embalagem_id, delta)
            .await?;

        let registrado = self
            .repo
            .insert_movimento(&mut *tx, tenant_id, movimento, delta)
            .await?;

        tx.commit().await?;

        Ok(AjusteResultado { saldo, movimento: registrado })
    }

    /// Ajuste manual de saldo de embalagem numa loja.
    pub async fn adjust<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: AjustePayload,
    ) -> Result<AjusteResultado, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        for (cadastro, id) in [
            (Cadastro::Loja, payload.loja_id),
            (Cadastro::Embalagem, payload.embalagem_id),
        ] {
            self.cadastros.exigir(&mut *tx, tenant_id, cadastro, id).await?;
        }

        let movimento = NovoMovimento::from(payload);
        let resultado = self.aplicar_movimento(&mut *tx, tenant_id, &movimento).await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            loja_id = %movimento.loja_id,
            embalagem_id = %movimento.embalagem_id,
            tipo = ?movimento.tipo,
            saldo_quantidade = resultado.saldo.saldo_quantidade,
            saldo_deposito = %resultado.saldo.saldo_deposito,
            "Ajuste de embalagem registrado"
        );

        Ok(resultado)
    }

    pub async fn list_saldos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &SaldoFilters,
        page: &PageParams,
    ) -> Result<Paginated<EmbalagemSaldo>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total = self.repo.count_saldos(&mut *tx, tenant_id, filters).await?;
        let saldos = self.repo.list_saldos(&mut *tx, tenant_id, filters, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(saldos, page, total))
    }

    pub async fn list_movimentos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &MovimentoFilters,
        page: &PageParams,
    ) -> Result<Paginated<EmbalagemMovimento>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if let (Some(inicio), Some(fim)) = (filters.data_inicio, filters.data_fim) {
            if inicio > fim {
                return Err(AppError::business("dataInicio deve ser anterior a dataFim"));
            }
        }

        let mut tx = executor.begin().await?;

        let total = self.repo.count_movimentos(&mut *tx, tenant_id, filters).await?;
        let movimentos = self.repo.list_movimentos(&mut *tx, tenant_id, filters, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(movimentos, page, total))
    }
}
