// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::{
    common::error::ApiError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Atributo, Claims, Role},
};

/// Política de acesso de uma rota: qualquer um dos papéis e, se houver,
/// o atributo de perfil.
pub trait AccessPolicy: Send + Sync + 'static {
    /// Vazio = qualquer usuário autenticado.
    fn roles() -> &'static [Role];

    fn atributo() -> Option<Atributo> {
        None
    }

    fn permite(claims: &Claims) -> bool {
        let roles = Self::roles();
        let por_papel = roles.is_empty() || claims.has_any_role(roles);
        let por_atributo = Self::atributo().is_none_or(|a| claims.atributos.has(a));
        por_papel && por_atributo
    }
}

/// O Extractor (Guardião)
pub struct RequireAccess<P>(pub PhantomData<P>);

impl<P, S> FromRequestParts<S> for RequireAccess<P>
where
    P: AccessPolicy,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthenticatedUser>().ok_or(ApiError {
            status: StatusCode::UNAUTHORIZED,
            error: "Usuário não autenticado".into(),
            details: None,
        })?;

        if !P::permite(&user.0) {
            tracing::debug!(user_id = %user.0.sub, roles = ?user.0.roles, "Acesso negado");
            return Err(ApiError {
                status: StatusCode::FORBIDDEN,
                error: "Você não tem permissão para realizar esta ação.".into(),
                details: None,
            });
        }

        Ok(RequireAccess(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS POLÍTICAS (TIPOS)
// ---

const GESTAO: &[Role] = &[Role::TenantOwner, Role::Gestor];
const OPERACAO: &[Role] = &[Role::TenantOwner, Role::Gestor, Role::Comprador];
const FINANCEIRO: &[Role] = &[Role::TenantOwner, Role::Gestor, Role::Financeiro];

pub struct CompraCriar;
impl AccessPolicy for CompraCriar {
    fn roles() -> &'static [Role] { OPERACAO }
    fn atributo() -> Option<Atributo> { Some(Atributo::PerfilCompras) }
}

pub struct CompraGerir;
impl AccessPolicy for CompraGerir {
    fn roles() -> &'static [Role] { OPERACAO }
}

pub struct CompraExcluir;
impl AccessPolicy for CompraExcluir {
    fn roles() -> &'static [Role] { GESTAO }
}

pub struct RomaneioGerir;
impl AccessPolicy for RomaneioGerir {
    fn roles() -> &'static [Role] { OPERACAO }
}

pub struct EmbalagemAjustar;
impl AccessPolicy for EmbalagemAjustar {
    fn roles() -> &'static [Role] { OPERACAO }
}

pub struct DevolucaoGerir;
impl AccessPolicy for DevolucaoGerir {
    fn roles() -> &'static [Role] { OPERACAO }
}

pub struct FinanceiroLer;
impl AccessPolicy for FinanceiroLer {
    fn roles() -> &'static [Role] { &[] }
    fn atributo() -> Option<Atributo> { Some(Atributo::PerfilFinanceiro) }
}

pub struct FinanceiroGerir;
impl AccessPolicy for FinanceiroGerir {
    fn roles() -> &'static [Role] { FINANCEIRO }
    fn atributo() -> Option<Atributo> { Some(Atributo::PerfilFinanceiro) }
}
