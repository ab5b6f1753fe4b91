// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Papéis emitidos pelo provedor de identidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TenantOwner,
    Gestor,
    Comprador,
    OperadorLoja,
    Financeiro,
    Auditor,
    SuporteSaas,
}

/// Atributos de perfil (ABAC) carregados no token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atributos {
    #[serde(default)]
    pub perfil_compras: bool,
    #[serde(default)]
    pub perfil_financeiro: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atributo {
    PerfilCompras,
    PerfilFinanceiro,
}

impl Atributos {
    pub fn has(&self, atributo: Atributo) -> bool {
        match atributo {
            Atributo::PerfilCompras => self.perfil_compras,
            Atributo::PerfilFinanceiro => self.perfil_financeiro,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // ID do usuário
    pub tenant_id: Uuid,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub lojas_permitidas: Vec<Uuid>,
    #[serde(default)]
    pub atributos: Atributos,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }

    /// Dono e gestor enxergam todas as lojas do tenant.
    pub fn ve_todas_as_lojas(&self) -> bool {
        self.has_any_role(&[Role::TenantOwner, Role::Gestor])
    }

    pub fn pode_acessar_loja(&self, loja_id: Uuid) -> bool {
        self.ve_todas_as_lojas() || self.lojas_permitidas.contains(&loja_id)
    }

    /// `None` = sem restrição de loja.
    pub fn escopo_lojas(&self) -> Option<&[Uuid]> {
        if self.ve_todas_as_lojas() {
            None
        } else {
            Some(&self.lojas_permitidas)
        }
    }
}
