// src/db/financeiro_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Executor, FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::financeiro::{
        NovoTituloFornecedor, NovoTituloLoja, TituloFilters, TituloFornecedor, TituloLoja,
        TituloOrigem, TituloResolvido, TituloStatus,
    },
};

/// O que fazer com `data_pagamento` numa transição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPagamento {
    Definir(DateTime<Utc>),
    Limpar,
    Manter,
}

#[derive(Debug, Clone, Default)]
pub struct FinanceiroRepository;

impl FinanceiroRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  EMISSÃO (chamada só pelos fluxos)
    // =========================================================================

    pub async fn insert_titulo_loja<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        novo: &NovoTituloLoja,
    ) -> Result<TituloLoja, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = sqlx::query_as::<_, TituloLoja>(
            r#"
            INSERT INTO titulos_loja_comprador (
                tenant_id, tipo, loja_id, romaneio_id, devolucao_id,
                valor_principal, valor_depositos, valor_total, data_vencimento, observacoes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(novo.tipo)
        .bind(novo.loja_id)
        .bind(novo.romaneio_id)
        .bind(novo.devolucao_id)
        .bind(novo.valor_principal)
        .bind(novo.valor_depositos)
        .bind(novo.valor_total())
        .bind(novo.data_vencimento)
        .bind(novo.observacoes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(titulo)
    }

    pub async fn insert_titulo_fornecedor<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        novo: &NovoTituloFornecedor,
    ) -> Result<TituloFornecedor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = sqlx::query_as::<_, TituloFornecedor>(
            r#"
            INSERT INTO titulos_comprador_fornecedor (
                tenant_id, tipo, fornecedor_id, compra_id, valor_principal, data_vencimento, observacoes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(novo.tipo)
        .bind(novo.fornecedor_id)
        .bind(novo.compra_id)
        .bind(novo.valor_principal)
        .bind(novo.data_vencimento)
        .bind(novo.observacoes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(titulo)
    }

    /// Título a receber em aberto do romaneio para a loja, travado até o fim
    /// da transação. `None` se não houver.
    pub async fn lock_titulo_romaneio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        romaneio_id: Uuid,
        loja_id: Uuid,
    ) -> Result<Option<TituloLoja>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = sqlx::query_as::<_, TituloLoja>(
            r#"
            SELECT * FROM titulos_loja_comprador
            WHERE tenant_id = $1 AND romaneio_id = $2 AND loja_id = $3
              AND tipo = 'receber' AND status = 'aberto'
            ORDER BY data_emissao
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(romaneio_id)
        .bind(loja_id)
        .fetch_optional(executor)
        .await?;

        Ok(titulo)
    }

    /// Abate `valor` do principal (e do total) de um título de loja.
    pub async fn abater_titulo_loja<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        valor: Decimal,
    ) -> Result<TituloLoja, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = sqlx::query_as::<_, TituloLoja>(
            r#"
            UPDATE titulos_loja_comprador SET
                valor_principal = valor_principal - $3,
                valor_total = valor_total - $3,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(valor)
        .fetch_one(executor)
        .await?;

        Ok(titulo)
    }

    // =========================================================================
    //  RESOLUÇÃO / TRANSIÇÕES
    // =========================================================================

    async fn find_row<'e, E, T>(
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT * FROM {} WHERE id = $1 AND tenant_id = $2", origem.tabela());
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    /// Busca o título numa das duas tabelas.
    pub async fn find<'e, E>(
        &self,
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TituloResolvido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = match origem {
            TituloOrigem::Loja => Self::find_row::<_, TituloLoja>(executor, origem, tenant_id, id)
                .await?
                .map(TituloResolvido::Loja),
            TituloOrigem::Fornecedor => {
                Self::find_row::<_, TituloFornecedor>(executor, origem, tenant_id, id)
                    .await?
                    .map(TituloResolvido::Fornecedor)
            }
        };

        Ok(titulo)
    }

    #[allow(clippy::too_many_arguments)]
    async fn transition_row<'e, E, T>(
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        id: Uuid,
        from: &[TituloStatus],
        to: TituloStatus,
        data_pagamento: DataPagamento,
        observacoes: Option<&str>,
    ) -> Result<Option<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let (alterar_data, nova_data) = match data_pagamento {
            DataPagamento::Definir(data) => (true, Some(data)),
            DataPagamento::Limpar => (true, None),
            DataPagamento::Manter => (false, None),
        };

        let sql = format!(
            r#"
            UPDATE {} SET
                status = $3,
                data_pagamento = CASE WHEN $4 THEN $5 ELSE data_pagamento END,
                observacoes = COALESCE($6, observacoes),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = ANY($7)
            RETURNING *
            "#,
            origem.tabela()
        );

        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(tenant_id)
            .bind(to)
            .bind(alterar_data)
            .bind(nova_data)
            .bind(observacoes)
            .bind(from.to_vec())
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    /// UPDATE condicional do status (só sai de um dos estados em `from`).
    #[allow(clippy::too_many_arguments)]
    pub async fn transition<'e, E>(
        &self,
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        id: Uuid,
        from: &[TituloStatus],
        to: TituloStatus,
        data_pagamento: DataPagamento,
        observacoes: Option<&str>,
    ) -> Result<Option<TituloResolvido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let titulo = match origem {
            TituloOrigem::Loja => Self::transition_row::<_, TituloLoja>(
                executor, origem, tenant_id, id, from, to, data_pagamento, observacoes,
            )
            .await?
            .map(TituloResolvido::Loja),
            TituloOrigem::Fornecedor => Self::transition_row::<_, TituloFornecedor>(
                executor, origem, tenant_id, id, from, to, data_pagamento, observacoes,
            )
            .await?
            .map(TituloResolvido::Fornecedor),
        };

        Ok(titulo)
    }

    // =========================================================================
    //  LISTAGEM
    // =========================================================================

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        origem: TituloOrigem,
        tenant_id: Uuid,
        filters: &TituloFilters,
    ) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        match origem {
            TituloOrigem::Loja => {
                if let Some(loja_id) = filters.loja_id {
                    qb.push(" AND loja_id = ").push_bind(loja_id);
                }
            }
            TituloOrigem::Fornecedor => {
                if let Some(fornecedor_id) = filters.fornecedor_id {
                    qb.push(" AND fornecedor_id = ").push_bind(fornecedor_id);
                }
            }
        }
    }

    async fn list_rows<'e, E, T>(
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        filters: &TituloFilters,
        page: &PageParams,
    ) -> Result<Vec<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(origem.tabela());
        Self::push_filters(&mut qb, origem, tenant_id, filters);
        qb.push(" ORDER BY data_vencimento ASC, created_at ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<T>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn list_loja<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &TituloFilters,
        page: &PageParams,
    ) -> Result<Vec<TituloLoja>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::list_rows(executor, TituloOrigem::Loja, tenant_id, filters, page).await
    }

    pub async fn list_fornecedor<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &TituloFilters,
        page: &PageParams,
    ) -> Result<Vec<TituloFornecedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::list_rows(executor, TituloOrigem::Fornecedor, tenant_id, filters, page).await
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        origem: TituloOrigem,
        tenant_id: Uuid,
        filters: &TituloFilters,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        qb.push(origem.tabela());
        Self::push_filters(&mut qb, origem, tenant_id, filters);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }
}
