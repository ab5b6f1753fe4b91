// src/services/financeiro_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{financeiro_repo::DataPagamento, FinanceiroRepository},
    models::financeiro::{
        AcaoTitulo, BaixaPayload, NovoTituloFornecedor, NovoTituloLoja, TituloFilters,
        TituloFornecedor, TituloLoja, TituloOrigem, TituloResolvido, TituloStatus,
        TitulosListagem,
    },
};

#[derive(Clone)]
pub struct FinanceiroService {
    repo: FinanceiroRepository,
}

impl FinanceiroService {
    pub fn new(repo: FinanceiroRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  EMISSÃO (efeito colateral dos fluxos; roda na transação do chamador)
    // =========================================================================

    pub async fn emitir_titulo_loja<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        novo: &NovoTituloLoja,
    ) -> Result<TituloLoja, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = self.repo.insert_titulo_loja(executor, tenant_id, novo).await?;
        tracing::debug!(
            tenant_id = %tenant_id,
            titulo_id = %titulo.id,
            loja_id = %titulo.loja_id,
            tipo = ?titulo.tipo,
            valor_total = %titulo.valor_total,
            "Título de loja emitido"
        );
        Ok(titulo)
    }

    pub async fn emitir_titulo_fornecedor<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        novo: &NovoTituloFornecedor,
    ) -> Result<TituloFornecedor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = self.repo.insert_titulo_fornecedor(executor, tenant_id, novo).await?;
        tracing::debug!(
            tenant_id = %tenant_id,
            titulo_id = %titulo.id,
            fornecedor_id = %titulo.fornecedor_id,
            valor_principal = %titulo.valor_principal,
            "Título de fornecedor emitido"
        );
        Ok(titulo)
    }

    /// Estorno de devolução: abate o valor do título em aberto do romaneio.
    /// O principal nunca fica negativo.
    pub async fn abater_titulo_romaneio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        romaneio_id: Uuid,
        loja_id: Uuid,
        valor: Decimal,
    ) -> Result<TituloLoja, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let titulo = self
            .repo
            .lock_titulo_romaneio(&mut *tx, tenant_id, romaneio_id, loja_id)
            .await?
            .ok_or_else(|| {
                AppError::business("Nenhum título em aberto do romaneio para esta loja")
            })?;

        if valor > titulo.valor_principal {
            return Err(AppError::business(format!(
                "Valor da devolução ({valor}) excede o saldo do título ({})",
                titulo.valor_principal
            )));
        }

        let titulo = self.repo.abater_titulo_loja(&mut *tx, tenant_id, titulo.id, valor).await?;
        tx.commit().await?;

        Ok(titulo)
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    /// Procura primeiro entre os títulos de loja, depois entre os de fornecedor.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<TituloResolvido, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut encontrado = None;
        for origem in TituloOrigem::ORDEM {
            encontrado = self.repo.find(&mut *tx, origem, tenant_id, id).await?;
            if encontrado.is_some() {
                break;
            }
        }
        tx.commit().await?;

        encontrado.ok_or_else(|| AppError::not_found("Título não encontrado"))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &TituloFilters,
        page: &PageParams,
    ) -> Result<TitulosListagem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let titulos_loja = if filters.inclui(TituloOrigem::Loja) {
            let total = self.repo.count(&mut *tx, TituloOrigem::Loja, tenant_id, filters).await?;
            let data = self.repo.list_loja(&mut *tx, tenant_id, filters, page).await?;
            Some(Paginated::new(data, page, total))
        } else {
            None
        };

        let titulos_fornecedor = if filters.inclui(TituloOrigem::Fornecedor) {
            let total = self
                .repo
                .count(&mut *tx, TituloOrigem::Fornecedor, tenant_id, filters)
                .await?;
            let data = self.repo.list_fornecedor(&mut *tx, tenant_id, filters, page).await?;
            Some(Paginated::new(data, page, total))
        } else {
            None
        };

        tx.commit().await?;
        Ok(TitulosListagem { titulos_loja, titulos_fornecedor })
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    async fn transicionar<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        acao: AcaoTitulo,
        data_pagamento: DataPagamento,
        observacoes: Option<&str>,
    ) -> Result<TituloResolvido, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let titulo = self.resolve(&mut *tx, tenant_id, id).await?;
        let novo_status = titulo.status().apply(acao)?;

        let atualizado = self
            .repo
            .transition(
                &mut *tx,
                titulo.origem(),
                tenant_id,
                id,
                TituloStatus::origens(acao),
                novo_status,
                data_pagamento,
                observacoes,
            )
            .await?;

        let atualizado = match atualizado {
            Some(t) => t,
            None => {
                // Outra operação mudou o status entre a leitura e o UPDATE.
                let atual = self.resolve(&mut *tx, tenant_id, id).await?;
                atual.status().apply(acao)?;
                return Err(AppError::business("Título alterado por outra operação"));
            }
        };

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            titulo_id = %id,
            origem = ?atualizado.origem(),
            acao = ?acao,
            status = ?novo_status,
            "Título atualizado"
        );

        Ok(atualizado)
    }

    /// aberto|parcial -> pago
    pub async fn settle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &BaixaPayload,
    ) -> Result<TituloResolvido, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let data = payload.data_pagamento.unwrap_or_else(Utc::now);
        self.transicionar(
            executor,
            tenant_id,
            id,
            AcaoTitulo::Baixar,
            DataPagamento::Definir(data),
            payload.observacoes.as_deref(),
        )
        .await
    }

    /// pago -> aberto
    pub async fn reverse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<TituloResolvido, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.transicionar(executor, tenant_id, id, AcaoTitulo::Estornar, DataPagamento::Limpar, None)
            .await
    }

    /// aberto|parcial -> cancelado
    pub async fn cancel_title<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<TituloResolvido, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.transicionar(executor, tenant_id, id, AcaoTitulo::Cancelar, DataPagamento::Manter, None)
            .await
    }
}
