// src/db/cadastros_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Cadastros mantidos fora deste núcleo; aqui só checamos existência.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadastro {
    Fornecedor,
    Loja,
    Produto,
    Embalagem,
}

impl Cadastro {
    fn tabela(self) -> &'static str {
        match self {
            Cadastro::Fornecedor => "fornecedores",
            Cadastro::Loja => "lojas",
            Cadastro::Produto => "produtos",
            Cadastro::Embalagem => "embalagens",
        }
    }

    pub fn nao_encontrado(self) -> AppError {
        AppError::not_found(match self {
            Cadastro::Fornecedor => "Fornecedor não encontrado",
            Cadastro::Loja => "Loja não encontrada",
            Cadastro::Produto => "Produto não encontrado",
            Cadastro::Embalagem => "Embalagem não encontrada",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CadastrosRepository;

impl CadastrosRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cadastro: Cadastro,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND tenant_id = $2)",
            cadastro.tabela()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    /// Como `exists`, mas já devolve o NotFound do cadastro.
    pub async fn exigir<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cadastro: Cadastro,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if self.exists(executor, tenant_id, cadastro, id).await? {
            Ok(())
        } else {
            Err(cadastro.nao_encontrado())
        }
    }
}
