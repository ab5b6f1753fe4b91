// src/db/compras_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::compras::{
        Compra, CompraFilters, CompraItem, CompraItemPayload, CompraStatus, MetodoPagamento,
        UpdateCompraPayload,
    },
};

#[derive(Debug, Clone, Default)]
pub struct ComprasRepository;

/// Dados já calculados para gravar o cabeçalho da compra.
pub struct NovaCompra<'a> {
    pub numero: &'a str,
    pub fornecedor_id: Uuid,
    pub comprador_user_id: Uuid,
    pub data_compra: DateTime<Utc>,
    pub valor_total: Decimal,
    pub descontos: Decimal,
    pub acrescimos: Decimal,
    pub metodo_pagamento: MetodoPagamento,
    pub observacoes: Option<&'a str>,
}

impl ComprasRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        nova: &NovaCompra<'_>,
    ) -> Result<Compra, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let compra = sqlx::query_as::<_, Compra>(
            r#"
            INSERT INTO compras (
                tenant_id, numero, fornecedor_id, comprador_user_id, data_compra,
                valor_total, descontos, acrescimos, metodo_pagamento, observacoes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(nova.numero)
        .bind(nova.fornecedor_id)
        .bind(nova.comprador_user_id)
        .bind(nova.data_compra)
        .bind(nova.valor_total)
        .bind(nova.descontos)
        .bind(nova.acrescimos)
        .bind(nova.metodo_pagamento)
        .bind(nova.observacoes)
        .fetch_one(executor)
        .await?;

        Ok(compra)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        compra_id: Uuid,
        item: &CompraItemPayload,
    ) -> Result<CompraItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, CompraItem>(
            r#"
            INSERT INTO compras_itens (
                tenant_id, compra_id, produto_id, quantidade_total, preco_unitario,
                unidade_medida, embalagem_id, quantidade_embalagens, valor_deposito_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(compra_id)
        .bind(item.produto_id)
        .bind(item.quantidade_total)
        .bind(item.preco_unitario)
        .bind(item.unidade_medida)
        .bind(item.embalagem_id)
        .bind(item.quantidade_embalagens)
        .bind(item.valor_deposito_total)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Compra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let compra = sqlx::query_as::<_, Compra>(
            "SELECT * FROM compras WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(compra)
    }

    pub async fn list_itens<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        compra_id: Uuid,
    ) -> Result<Vec<CompraItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = sqlx::query_as::<_, CompraItem>(
            r#"
            SELECT * FROM compras_itens
            WHERE compra_id = $1 AND tenant_id = $2
            ORDER BY id
            "#,
        )
        .bind(compra_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(itens)
    }

    /// Edição parcial, só enquanto pendente. O total é recalculado a partir
    /// dos itens gravados, cada linha arredondada a centavos como na criação.
    /// `None` = a compra não estava mais pendente.
    pub async fn update_pendente<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateCompraPayload,
    ) -> Result<Option<Compra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let compra = sqlx::query_as::<_, Compra>(
            r#"
            UPDATE compras c SET
                descontos = COALESCE($3, c.descontos),
                acrescimos = COALESCE($4, c.acrescimos),
                metodo_pagamento = COALESCE($5, c.metodo_pagamento),
                observacoes = COALESCE($6, c.observacoes),
                valor_total = (
                    SELECT COALESCE(SUM(ROUND(i.quantidade_total * i.preco_unitario, 2) + i.valor_deposito_total), 0)
                    FROM compras_itens i
                    WHERE i.compra_id = c.id
                ) - COALESCE($3, c.descontos) + COALESCE($4, c.acrescimos),
                updated_at = NOW()
            WHERE c.id = $1 AND c.tenant_id = $2 AND c.status = 'pendente'
            RETURNING c.*
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(payload.descontos)
        .bind(payload.acrescimos)
        .bind(payload.metodo_pagamento)
        .bind(payload.observacoes.as_deref())
        .fetch_optional(executor)
        .await?;

        Ok(compra)
    }

    /// UPDATE condicional (compare-and-swap) do status.
    pub async fn transition_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        from: CompraStatus,
        to: CompraStatus,
    ) -> Result<Option<Compra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let compra = sqlx::query_as::<_, Compra>(
            r#"
            UPDATE compras SET status = $4, updated_at = NOW()
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

        Ok(compra)
    }

    /// Alguma linha de romaneio distribui itens desta compra?
    pub async fn has_distribuicoes<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        compra_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM romaneios_itens ri
                JOIN compras_itens ci ON ci.id = ri.compra_item_id
                WHERE ci.compra_id = $1 AND ci.tenant_id = $2
            )
            "#,
        )
        .bind(compra_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Remove a compra (itens vão em cascata) se ainda estiver pendente.
    pub async fn delete_pendente<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM compras WHERE id = $1 AND tenant_id = $2 AND status = 'pendente'",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filters: &CompraFilters) {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        if let Some(fornecedor_id) = filters.fornecedor_id {
            qb.push(" AND fornecedor_id = ").push_bind(fornecedor_id);
        }
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
        filters: &CompraFilters,
        page: &PageParams,
    ) -> Result<Vec<Compra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM compras");
        Self::push_filters(&mut qb, tenant_id, filters);
        qb.push(" ORDER BY data_compra DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let compras = qb.build_query_as::<Compra>().fetch_all(executor).await?;
        Ok(compras)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &CompraFilters,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM compras");
        Self::push_filters(&mut qb, tenant_id, filters);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }
}
