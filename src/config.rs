// src/config.rs

use std::{env, net::SocketAddr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CadastrosRepository, ComprasRepository, DevolucoesRepository, EmbalagensRepository,
        FinanceiroRepository, RomaneiosRepository,
    },
    services::{
        compras_service::ComprasService, devolucoes_service::DevolucoesService,
        embalagens_service::EmbalagensService, financeiro_service::FinanceiroService,
        romaneios_service::RomaneiosService,
    },
};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub server_addr: SocketAddr,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.parse().with_context(|| format!("{name} inválida: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Lê a configuração do ambiente (`.env` opcional).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let default_addr: SocketAddr = DEFAULT_SERVER_ADDR.parse()?;

        Ok(Self {
            database_url,
            jwt_secret,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            db_acquire_timeout: Duration::from_secs(var_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?),
            server_addr: var_or("SERVER_ADDR", default_addr)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub compras_service: ComprasService,
    pub romaneios_service: RomaneiosService,
    pub embalagens_service: EmbalagensService,
    pub devolucoes_service: DevolucoesService,
    pub financeiro_service: FinanceiroService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone()))
    }

    /// Monta o grafo de dependências sobre uma pool já criada.
    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let cadastros = CadastrosRepository::new();

        let financeiro_service = FinanceiroService::new(FinanceiroRepository::new());
        let embalagens_service = EmbalagensService::new(EmbalagensRepository::new(), cadastros.clone());

        let compras_service = ComprasService::new(
            ComprasRepository::new(),
            cadastros.clone(),
            financeiro_service.clone(),
        );
        let romaneios_service = RomaneiosService::new(
            RomaneiosRepository::new(),
            cadastros.clone(),
            embalagens_service.clone(),
            financeiro_service.clone(),
        );
        let devolucoes_service = DevolucoesService::new(
            DevolucoesRepository::new(),
            RomaneiosRepository::new(),
            cadastros,
            financeiro_service.clone(),
        );

        Self {
            db_pool,
            jwt_secret,
            compras_service,
            romaneios_service,
            embalagens_service,
            devolucoes_service,
            financeiro_service,
        }
    }
}
