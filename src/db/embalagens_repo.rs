// src/db/embalagens_repo.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::embalagens::{
        DeltaSaldo, EmbalagemMovimento, EmbalagemSaldo, MovimentoFilters, NovoMovimento,
        SaldoFilters,
    },
};

#[derive(Debug, Clone, Default)]
pub struct EmbalagensRepository;

impl EmbalagensRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insere o saldo ou soma o delta no existente, num único comando.
    pub async fn upsert_saldo<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        loja_id: Uuid,
        embalagem_id: Uuid,
        delta: DeltaSaldo,
    ) -> Result<EmbalagemSaldo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saldo = sqlx::query_as::<_, EmbalagemSaldo>(
            r#"
            INSERT INTO embalagens_saldos (tenant_id, loja_id, embalagem_id, saldo_quantidade, saldo_deposito)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, loja_id, embalagem_id) DO UPDATE SET
                saldo_quantidade = embalagens_saldos.saldo_quantidade + EXCLUDED.saldo_quantidade,
                saldo_deposito = embalagens_saldos.saldo_deposito + EXCLUDED.saldo_deposito,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(loja_id)
        .bind(embalagem_id)
        .bind(delta.quantidade)
        .bind(delta.deposito)
        .fetch_one(executor)
        .await?;

        Ok(saldo)
    }

    pub async fn insert_movimento<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        movimento: &NovoMovimento,
        delta: DeltaSaldo,
    ) -> Result<EmbalagemMovimento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimento = sqlx::query_as::<_, EmbalagemMovimento>(
            r#"
            INSERT INTO embalagens_movimentos (
                tenant_id, loja_id, embalagem_id, tipo, quantidade, valor_deposito_total,
                delta_quantidade, delta_deposito, referencia_tipo, referencia_id, observacoes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(movimento.loja_id)
        .bind(movimento.embalagem_id)
        .bind(movimento.tipo)
        .bind(movimento.quantidade.saturating_abs())
        .bind(movimento.valor_deposito.abs())
        .bind(delta.quantidade)
        .bind(delta.deposito)
        .bind(movimento.referencia_tipo)
        .bind(movimento.referencia_id)
        .bind(movimento.observacoes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(movimento)
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    fn push_saldo_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filters: &SaldoFilters) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(loja_id) = filters.loja_id {
            qb.push(" AND loja_id = ").push_bind(loja_id);
        }
        if let Some(embalagem_id) = filters.embalagem_id {
            qb.push(" AND embalagem_id = ").push_bind(embalagem_id);
        }
    }

    pub async fn list_saldos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &SaldoFilters,
        page: &PageParams,
    ) -> Result<Vec<EmbalagemSaldo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM embalagens_saldos");
        Self::push_saldo_filters(&mut qb, tenant_id, filters);
        qb.push(" ORDER BY loja_id, embalagem_id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let saldos = qb.build_query_as::<EmbalagemSaldo>().fetch_all(executor).await?;
        Ok(saldos)
    }

    pub async fn count_saldos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &SaldoFilters,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM embalagens_saldos");
        Self::push_saldo_filters(&mut qb, tenant_id, filters);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }

    fn push_movimento_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        tenant_id: Uuid,
        filters: &MovimentoFilters,
    ) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(loja_id) = filters.loja_id {
            qb.push(" AND loja_id = ").push_bind(loja_id);
        }
        if let Some(embalagem_id) = filters.embalagem_id {
            qb.push(" AND embalagem_id = ").push_bind(embalagem_id);
        }
        if let Some(tipo) = filters.tipo {
            qb.push(" AND tipo = ").push_bind(tipo);
        }
        if let Some(inicio) = filters.data_inicio {
            qb.push(" AND data_movimento >= ").push_bind(inicio);
        }
        if let Some(fim) = filters.data_fim {
            qb.push(" AND data_movimento <= ").push_bind(fim);
        }
    }

    pub async fn list_movimentos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &MovimentoFilters,
        page: &PageParams,
    ) -> Result<Vec<EmbalagemMovimento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM embalagens_movimentos");
        Self::push_movimento_filters(&mut qb, tenant_id, filters);
        qb.push(" ORDER BY data_movimento DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let movimentos = qb.build_query_as::<EmbalagemMovimento>().fetch_all(executor).await?;
        Ok(movimentos)
    }

    pub async fn count_movimentos<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &MovimentoFilters,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM embalagens_movimentos");
        Self::push_movimento_filters(&mut qb, tenant_id, filters);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }
}
