// src/services/devolucoes_service.rs

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{cadastros_repo::Cadastro, CadastrosRepository, DevolucoesRepository, RomaneiosRepository},
    models::{
        devolucoes::{
            CreateDevolucaoPayload, Devolucao, DevolucaoDetalhe, DevolucaoFilters,
            DevolucaoStatus, EfeitoFinanceiro, Tratamento,
        },
        financeiro::{vencimento_padrao, NovoTituloLoja, TituloTipo},
        lifecycle::{Lifecycle, Transition},
    },
    services::financeiro_service::FinanceiroService,
};

#[derive(Clone)]
pub struct DevolucoesService {
    repo: DevolucoesRepository,
    romaneios: RomaneiosRepository,
    cadastros: CadastrosRepository,
    financeiro: FinanceiroService,
}

fn checar_escopo(escopo: Option<&[Uuid]>, loja_id: Uuid) -> Result<(), AppError> {
    match escopo {
        Some(lojas) if !lojas.contains(&loja_id) => {
            Err(AppError::Forbidden("Você não tem acesso a esta loja.".into()))
        }
        _ => Ok(()),
    }
}

impl DevolucoesService {
    pub fn new(
        repo: DevolucoesRepository,
        romaneios: RomaneiosRepository,
        cadastros: CadastrosRepository,
        financeiro: FinanceiroService,
    ) -> Self {
        Self { repo, romaneios, cadastros, financeiro }
    }

    async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Devolucao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Devolução não encontrada"))
    }

    async fn detalhe<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        devolucao: Devolucao,
    ) -> Result<DevolucaoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = self.repo.list_itens(executor, tenant_id, devolucao.id).await?;
        Ok(DevolucaoDetalhe { devolucao, itens })
    }

    // --- CRIAR (pendente) ---
    /// `escopo` = lojas permitidas do usuário (`None` para dono/gestor).
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        escopo: Option<&[Uuid]>,
        payload: &CreateDevolucaoPayload,
    ) -> Result<DevolucaoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.itens.is_empty() {
            return Err(AppError::business("A devolução precisa de pelo menos um item"));
        }
        checar_escopo(escopo, payload.loja_id)?;

        let mut tx = executor.begin().await?;

        self.cadastros.exigir(&mut *tx, tenant_id, Cadastro::Loja, payload.loja_id).await?;

        let produtos: BTreeSet<Uuid> = payload.itens.iter().map(|i| i.produto_id).collect();
        for produto_id in produtos {
            self.cadastros.exigir(&mut *tx, tenant_id, Cadastro::Produto, produto_id).await?;
        }

        if let Some(romaneio_id) = payload.romaneio_id {
            if self.romaneios.find_by_id(&mut *tx, tenant_id, romaneio_id).await?.is_none() {
                return Err(AppError::not_found("Romaneio não encontrado"));
            }
        }

        let devolucao = self
            .repo
            .insert(
                &mut *tx,
                tenant_id,
                payload,
                payload.data_devolucao.unwrap_or_else(Utc::now),
                payload.total(),
            )
            .await?;

        let mut itens = Vec::with_capacity(payload.itens.len());
        for item in &payload.itens {
            itens.push(self.repo.insert_item(&mut *tx, tenant_id, devolucao.id, item).await?);
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            devolucao_id = %devolucao.id,
            loja_id = %devolucao.loja_id,
            tratamento = ?devolucao.tratamento,
            valor_total = %devolucao.valor_total,
            "Devolução registrada"
        );

        Ok(DevolucaoDetalhe { devolucao, itens })
    }

    pub async fn get<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        escopo: Option<&[Uuid]>,
        id: Uuid,
    ) -> Result<DevolucaoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let devolucao = self.find(&mut *tx, tenant_id, id).await?;
        checar_escopo(escopo, devolucao.loja_id)?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, devolucao).await?;
        tx.commit().await?;
        Ok(detalhe)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        escopo: Option<&[Uuid]>,
        filters: &DevolucaoFilters,
        page: &PageParams,
    ) -> Result<Paginated<Devolucao>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total = self.repo.count(&mut *tx, tenant_id, filters, escopo).await?;
        let devolucoes = self.repo.list(&mut *tx, tenant_id, filters, escopo, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(devolucoes, page, total))
    }

    // --- PROCESSAR: pendente -> processada + efeito do tratamento ---
    pub async fn process<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<DevolucaoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        atual.status.apply(Transition::Complete)?;

        // total recalculado a partir dos itens gravados
        let devolucao = DevolucaoStatus::confirm(
            self.repo.mark_processada(&mut *tx, tenant_id, id).await?,
            Transition::Complete,
        )?;
        let total: Decimal = devolucao.valor_total;

        match devolucao.tratamento.efeito(devolucao.romaneio_id) {
            EfeitoFinanceiro::NovoTituloPagar => {
                let titulo = self
                    .financeiro
                    .emitir_titulo_loja(
                        &mut *tx,
                        tenant_id,
                        &NovoTituloLoja {
                            tipo: TituloTipo::Pagar,
                            loja_id: devolucao.loja_id,
                            romaneio_id: devolucao.romaneio_id,
                            devolucao_id: Some(devolucao.id),
                            valor_principal: total,
                            valor_depositos: Decimal::ZERO,
                            data_vencimento: vencimento_padrao(Utc::now()),
                            observacoes: Some(format!("Crédito de devolução: {}", devolucao.motivo)),
                        },
                    )
                    .await?;
                tracing::info!(tenant_id = %tenant_id, devolucao_id = %id, titulo_id = %titulo.id, "Crédito gerado para a loja");
            }
            EfeitoFinanceiro::AbaterTituloRomaneio(romaneio_id) => {
                let titulo = self
                    .financeiro
                    .abater_titulo_romaneio(&mut *tx, tenant_id, romaneio_id, devolucao.loja_id, total)
                    .await?;
                tracing::info!(
                    tenant_id = %tenant_id,
                    devolucao_id = %id,
                    titulo_id = %titulo.id,
                    valor_total = %titulo.valor_total,
                    "Título do romaneio abatido"
                );
            }
            EfeitoFinanceiro::Nenhum => {
                if devolucao.romaneio_id.is_none() && devolucao.tratamento == Tratamento::Estorno {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        devolucao_id = %id,
                        "Estorno sem romaneio vinculado: nenhum título alterado"
                    );
                }
            }
        }

        let detalhe = self.detalhe(&mut *tx, tenant_id, devolucao).await?;
        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            devolucao_id = %id,
            tratamento = ?detalhe.devolucao.tratamento,
            valor_total = %total,
            "Devolução processada"
        );

        Ok(detalhe)
    }

    // --- CANCELAR: pendente -> cancelada ---
    pub async fn cancel<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<DevolucaoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        let novo_status = atual.status.apply(Transition::Cancel)?;

        let devolucao = DevolucaoStatus::confirm(
            self.repo
                .transition_status(&mut *tx, tenant_id, id, DevolucaoStatus::OPEN, novo_status)
                .await?,
            Transition::Cancel,
        )?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, devolucao).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, devolucao_id = %id, "Devolução cancelada");
        Ok(detalhe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_allows_listed_store_only() {
        let loja = Uuid::new_v4();
        assert!(checar_escopo(None, loja).is_ok());
        assert!(checar_escopo(Some(&[loja]), loja).is_ok());
        let err = checar_escopo(Some(&[Uuid::new_v4()]), loja).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
