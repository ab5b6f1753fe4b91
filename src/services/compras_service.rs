// src/services/compras_service.rs

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{
        cadastros_repo::Cadastro, compras_repo::NovaCompra, CadastrosRepository,
        ComprasRepository,
    },
    models::{
        compras::{
            gerar_numero, Compra, CompraDetalhe, CompraFilters, CompraStatus, CreateCompraPayload,
            UpdateCompraPayload,
        },
        financeiro::{vencimento_padrao, NovoTituloFornecedor, TituloTipo},
        lifecycle::{Lifecycle, Transition},
    },
    services::financeiro_service::FinanceiroService,
};

#[derive(Clone)]
pub struct ComprasService {
    repo: ComprasRepository,
    cadastros: CadastrosRepository,
    financeiro: FinanceiroService,
}

impl ComprasService {
    pub fn new(
        repo: ComprasRepository,
        cadastros: CadastrosRepository,
        financeiro: FinanceiroService,
    ) -> Self {
        Self { repo, cadastros, financeiro }
    }

    async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Compra, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Compra não encontrada"))
    }

    async fn detalhe<'e, E>(&self, executor: E, tenant_id: Uuid, compra: Compra) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = self.repo.list_itens(executor, tenant_id, compra.id).await?;
        Ok(CompraDetalhe { compra, itens })
    }

    // --- CREATE ---
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        comprador_user_id: Uuid,
        payload: &CreateCompraPayload,
    ) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.itens.is_empty() {
            return Err(AppError::business("A compra precisa de pelo menos um item"));
        }

        let mut tx = executor.begin().await?;

        self.cadastros
            .exigir(&mut *tx, tenant_id, Cadastro::Fornecedor, payload.fornecedor_id)
            .await?;

        let produtos: BTreeSet<Uuid> = payload.itens.iter().map(|i| i.produto_id).collect();
        for produto_id in produtos {
            self.cadastros.exigir(&mut *tx, tenant_id, Cadastro::Produto, produto_id).await?;
        }

        let agora = Utc::now();
        let numero = gerar_numero(agora);
        let nova = NovaCompra {
            numero: &numero,
            fornecedor_id: payload.fornecedor_id,
            comprador_user_id,
            data_compra: payload.data_compra.unwrap_or(agora),
            valor_total: payload.total(),
            descontos: payload.descontos,
            acrescimos: payload.acrescimos,
            metodo_pagamento: payload.metodo_pagamento,
            observacoes: payload.observacoes.as_deref(),
        };

        let compra = self.repo.insert(&mut *tx, tenant_id, &nova).await?;

        let mut itens = Vec::with_capacity(payload.itens.len());
        for item in &payload.itens {
            itens.push(self.repo.insert_item(&mut *tx, tenant_id, compra.id, item).await?);
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            compra_id = %compra.id,
            numero = %compra.numero,
            valor_total = %compra.valor_total,
            itens = itens.len(),
            "Compra criada"
        );

        Ok(CompraDetalhe { compra, itens })
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let compra = self.find(&mut *tx, tenant_id, id).await?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, compra).await?;
        tx.commit().await?;
        Ok(detalhe)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &CompraFilters,
        page: &PageParams,
    ) -> Result<Paginated<Compra>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total = self.repo.count(&mut *tx, tenant_id, filters).await?;
        let compras = self.repo.list(&mut *tx, tenant_id, filters, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(compras, page, total))
    }

    // --- UPDATE (só pendente) ---
    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateCompraPayload,
    ) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.is_empty() {
            return Err(AppError::business("Nenhum campo informado para atualização"));
        }

        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        atual.status.apply(Transition::Edit)?;

        let compra = CompraStatus::confirm(
            self.repo.update_pendente(&mut *tx, tenant_id, id, payload).await?,
            Transition::Edit,
        )?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, compra).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, compra_id = %id, "Compra atualizada");
        Ok(detalhe)
    }

    // --- CONCLUIR: pendente -> concluida + título a pagar ao fornecedor ---
    pub async fn conclude<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        let novo_status = atual.status.apply(Transition::Complete)?;

        let compra = CompraStatus::confirm(
            self.repo
                .transition_status(&mut *tx, tenant_id, id, CompraStatus::OPEN, novo_status)
                .await?,
            Transition::Complete,
        )?;

        let titulo = self
            .financeiro
            .emitir_titulo_fornecedor(
                &mut *tx,
                tenant_id,
                &NovoTituloFornecedor {
                    tipo: TituloTipo::Pagar,
                    fornecedor_id: compra.fornecedor_id,
                    compra_id: Some(compra.id),
                    valor_principal: compra.valor_total,
                    data_vencimento: vencimento_padrao(Utc::now()),
                    observacoes: Some(format!("Compra {}", compra.numero)),
                },
            )
            .await?;

        let detalhe = self.detalhe(&mut *tx, tenant_id, compra).await?;
        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            compra_id = %id,
            titulo_id = %titulo.id,
            valor = %titulo.valor_principal,
            "Compra concluída"
        );

        Ok(detalhe)
    }

    // --- CANCELAR: pendente -> cancelada (sem efeito financeiro) ---
    pub async fn cancel<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<CompraDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        let novo_status = atual.status.apply(Transition::Cancel)?;

        let compra = CompraStatus::confirm(
            self.repo
                .transition_status(&mut *tx, tenant_id, id, CompraStatus::OPEN, novo_status)
                .await?,
            Transition::Cancel,
        )?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, compra).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, compra_id = %id, "Compra cancelada");
        Ok(detalhe)
    }

    // --- EXCLUIR: só pendente e sem romaneio distribuindo seus itens ---
    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        const SO_PENDENTES: &str = "Apenas compras pendentes podem ser excluídas";

        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        if atual.status.is_terminal() {
            return Err(AppError::business(SO_PENDENTES));
        }

        if self.repo.has_distribuicoes(&mut *tx, tenant_id, id).await? {
            return Err(AppError::business(
                "Compra possui itens distribuídos em romaneios e não pode ser excluída",
            ));
        }

        if !self.repo.delete_pendente(&mut *tx, tenant_id, id).await? {
            return Err(AppError::business(SO_PENDENTES));
        }

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, compra_id = %id, "Compra excluída");
        Ok(())
    }
}
