#![allow(dead_code)]

use std::sync::Once;

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use ceasa_backend::{common::db_utils::begin_tenant_tx, config::AppState};

static TRACING: Once = Once::new();

pub struct Cenario {
    pub state: AppState,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub fornecedor_id: Uuid,
    pub loja_a: Uuid,
    pub loja_b: Uuid,
    pub produto_id: Uuid,
    pub embalagem_id: Uuid,
}

impl Cenario {
    pub async fn tx(&self) -> Transaction<'static, Postgres> {
        begin_tenant_tx(&self.state.db_pool, self.tenant_id, self.user_id)
            .await
            .unwrap()
    }
}

async fn insert_id(pool: &PgPool, sql: &str, tenant_id: Uuid, nome: &str) -> Uuid {
    sqlx::query_scalar(sql)
        .bind(tenant_id)
        .bind(nome)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Pool migrada + cadastros mínimos sob um tenant novo.
pub async fn cenario() -> Cenario {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("ceasa_backend=debug,sqlx=warn")
            .with_test_writer()
            .init();
    });

    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    let tenant_id: Uuid = sqlx::query_scalar("INSERT INTO tenants (nome) VALUES ($1) RETURNING id")
        .bind(format!("tenant-{}", Uuid::new_v4()))
        .fetch_one(&pool)
        .await
        .unwrap();

    let loja = "INSERT INTO lojas (tenant_id, nome) VALUES ($1, $2) RETURNING id";
    let loja_a = insert_id(&pool, loja, tenant_id, "Loja A").await;
    let loja_b = insert_id(&pool, loja, tenant_id, "Loja B").await;
    let fornecedor_id = insert_id(
        &pool,
        "INSERT INTO fornecedores (tenant_id, nome) VALUES ($1, $2) RETURNING id",
        tenant_id,
        "Sítio Boa Vista",
    )
    .await;
    let produto_id = insert_id(
        &pool,
        "INSERT INTO produtos (tenant_id, nome) VALUES ($1, $2) RETURNING id",
        tenant_id,
        "Tomate",
    )
    .await;
    let embalagem_id = insert_id(
        &pool,
        "INSERT INTO embalagens (tenant_id, descricao) VALUES ($1, $2) RETURNING id",
        tenant_id,
        "Caixa K",
    )
    .await;

    Cenario {
        state: AppState::from_pool(pool, "segredo".into()),
        tenant_id,
        user_id: Uuid::new_v4(),
        fornecedor_id,
        loja_a,
        loja_b,
        produto_id,
        embalagem_id,
    }
}
