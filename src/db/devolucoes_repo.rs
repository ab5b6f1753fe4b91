// src/db/devolucoes_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::devolucoes::{
        CreateDevolucaoPayload, Devolucao, DevolucaoFilters, DevolucaoItem, DevolucaoItemPayload,
        DevolucaoStatus,
    },
};

#[derive(Debug, Clone, Default)]
pub struct DevolucoesRepository;

impl DevolucoesRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateDevolucaoPayload,
        data_devolucao: DateTime<Utc>,
        valor_total: Decimal,
    ) -> Result<Devolucao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let devolucao = sqlx::query_as::<_, Devolucao>(
            r#"
            INSERT INTO devolucoes (
                tenant_id, loja_id, romaneio_id, data_devolucao, motivo,
                tratamento, valor_total, observacoes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.loja_id)
        .bind(payload.romaneio_id)
        .bind(data_devolucao)
        .bind(payload.motivo.as_str())
        .bind(payload.tratamento)
        .bind(valor_total)
        .bind(payload.observacoes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(devolucao)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        devolucao_id: Uuid,
        item: &DevolucaoItemPayload,
    ) -> Result<DevolucaoItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, DevolucaoItem>(
            r#"
            INSERT INTO devolucoes_itens (
                tenant_id, devolucao_id, produto_id, quantidade,
                motivo_especifico, valor_unitario, valor_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(devolucao_id)
        .bind(item.produto_id)
        .bind(item.quantidade)
        .bind(item.motivo_especifico.as_deref())
        .bind(item.valor_unitario())
        .bind(item.valor_total())
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Devolucao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let devolucao = sqlx::query_as::<_, Devolucao>(
            "SELECT * FROM devolucoes WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(devolucao)
    }

    pub async fn list_itens<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        devolucao_id: Uuid,
    ) -> Result<Vec<DevolucaoItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = sqlx::query_as::<_, DevolucaoItem>(
            r#"
            SELECT * FROM devolucoes_itens
            WHERE devolucao_id = $1 AND tenant_id = $2
            ORDER BY id
            "#,
        )
        .bind(devolucao_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(itens)
    }

    /// pendente -> processada, recalculando o total a partir dos itens gravados.
    pub async fn mark_processada<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Devolucao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let devolucao = sqlx::query_as::<_, Devolucao>(
            r#"
            UPDATE devolucoes d SET
                status = 'processada',
                valor_total = (
                    SELECT COALESCE(SUM(i.valor_total), 0)
                    FROM devolucoes_itens i
                    WHERE i.devolucao_id = d.id
                ),
                updated_at = NOW()
            WHERE d.id = $1 AND d.tenant_id = $2 AND d.status = 'pendente'
            RETURNING d.*
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(devolucao)
    }

    pub async fn transition_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        from: DevolucaoStatus,
        to: DevolucaoStatus,
    ) -> Result<Option<Devolucao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let devolucao = sqlx::query_as::<_, Devolucao>(
            r#"
            UPDATE devolucoes SET status = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_optional(executor)
        .await?;

        Ok(devolucao)
    }

    /// `lojas = Some(..)` restringe às lojas permitidas do usuário.
    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        tenant_id: Uuid,
        filters: &DevolucaoFilters,
        lojas: Option<&[Uuid]>,
    ) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(loja_id) = filters.loja_id {
            qb.push(" AND loja_id = ").push_bind(loja_id);
        }
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(lojas) = lojas {
            qb.push(" AND loja_id = ANY(").push_bind(lojas.to_vec()).push(")");
        }
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &DevolucaoFilters,
        lojas: Option<&[Uuid]>,
        page: &PageParams,
    ) -> Result<Vec<Devolucao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM devolucoes");
        Self::push_filters(&mut qb, tenant_id, filters, lojas);
        qb.push(" ORDER BY data_devolucao DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let devolucoes = qb.build_query_as::<Devolucao>().fetch_all(executor).await?;
        Ok(devolucoes)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &DevolucaoFilters,
        lojas: Option<&[Uuid]>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM devolucoes");
        Self::push_filters(&mut qb, tenant_id, filters, lojas);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }
}
