// src/db/romaneios_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::romaneios::{
        Romaneio, RomaneioFilters, RomaneioItem, RomaneioItemPayload, RomaneioStatus,
        UpdateRomaneioPayload,
    },
};

#[derive(Debug, Clone, Default)]
pub struct RomaneiosRepository;

impl RomaneiosRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        comprador_user_id: Uuid,
        data_romaneio: DateTime<Utc>,
        observacoes: Option<&str>,
    ) -> Result<Romaneio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let romaneio = sqlx::query_as::<_, Romaneio>(
            r#"
            INSERT INTO romaneios (tenant_id, comprador_user_id, data_romaneio, observacoes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(comprador_user_id)
        .bind(data_romaneio)
        .bind(observacoes)
        .fetch_one(executor)
        .await?;

        Ok(romaneio)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        romaneio_id: Uuid,
        item: &RomaneioItemPayload,
    ) -> Result<RomaneioItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, RomaneioItem>(
            r#"
            INSERT INTO romaneios_itens (
                tenant_id, romaneio_id, loja_id, produto_id, compra_item_id,
                quantidade, preco_unitario, valor_total,
                embalagem_id, quantidade_embalagens, valor_deposito_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(romaneio_id)
        .bind(item.loja_id)
        .bind(item.produto_id)
        .bind(item.compra_item_id)
        .bind(item.quantidade)
        .bind(item.preco_unitario)
        .bind(item.valor_total())
        .bind(item.embalagem_id)
        .bind(item.quantidade_embalagens)
        .bind(item.valor_deposito_total)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    /// A linha de compra existe neste tenant?
    pub async fn compra_item_exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        compra_item_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM compras_itens WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(compra_item_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Romaneio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let romaneio = sqlx::query_as::<_, Romaneio>(
            "SELECT * FROM romaneios WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(romaneio)
    }

    pub async fn list_itens<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        romaneio_id: Uuid,
    ) -> Result<Vec<RomaneioItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = sqlx::query_as::<_, RomaneioItem>(
            r#"
            SELECT * FROM romaneios_itens
            WHERE romaneio_id = $1 AND tenant_id = $2
            ORDER BY id
            "#,
        )
        .bind(romaneio_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(itens)
    }

    pub async fn update_rascunho<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateRomaneioPayload,
    ) -> Result<Option<Romaneio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let romaneio = sqlx::query_as::<_, Romaneio>(
            r#"
            UPDATE romaneios SET
                data_romaneio = COALESCE($3, data_romaneio),
                observacoes = COALESCE($4, observacoes),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'rascunho'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(payload.data_romaneio)
        .bind(payload.observacoes.as_deref())
        .fetch_optional(executor)
        .await?;

        Ok(romaneio)
    }

    pub async fn transition_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        from: RomaneioStatus,
        to: RomaneioStatus,
    ) -> Result<Option<Romaneio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let romaneio = sqlx::query_as::<_, Romaneio>(
            r#"
            UPDATE romaneios SET status = $4, updated_at = NOW()
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

        Ok(romaneio)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filters: &RomaneioFilters) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(comprador) = filters.comprador_user_id {
            qb.push(" AND comprador_user_id = ").push_bind(comprador);
        }
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &RomaneioFilters,
        page: &PageParams,
    ) -> Result<Vec<Romaneio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM romaneios");
        Self::push_filters(&mut qb, tenant_id, filters);
        qb.push(" ORDER BY data_romaneio DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let romaneios = qb.build_query_as::<Romaneio>().fetch_all(executor).await?;
        Ok(romaneios)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &RomaneioFilters,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM romaneios");
        Self::push_filters(&mut qb, tenant_id, filters);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }
}
