// src/services/romaneios_service.rs

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{cadastros_repo::Cadastro, CadastrosRepository, RomaneiosRepository},
    models::{
        embalagens::{MovimentoTipo, NovoMovimento, ReferenciaTipo},
        financeiro::{vencimento_padrao, NovoTituloLoja, TituloTipo},
        lifecycle::{Lifecycle, Transition},
        romaneios::{
            agrupar_por_loja, GenerateRomaneioPayload, Romaneio, RomaneioDetalhe,
            RomaneioFilters, RomaneioStatus, UpdateRomaneioPayload,
        },
    },
    services::{embalagens_service::EmbalagensService, financeiro_service::FinanceiroService},
};

#[derive(Clone)]
pub struct RomaneiosService {
    repo: RomaneiosRepository,
    cadastros: CadastrosRepository,
    embalagens: EmbalagensService,
    financeiro: FinanceiroService,
}

impl RomaneiosService {
    pub fn new(
        repo: RomaneiosRepository,
        cadastros: CadastrosRepository,
        embalagens: EmbalagensService,
        financeiro: FinanceiroService,
    ) -> Self {
        Self { repo, cadastros, embalagens, financeiro }
    }

    async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Romaneio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Romaneio não encontrado"))
    }

    async fn detalhe<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        romaneio: Romaneio,
    ) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = self.repo.list_itens(executor, tenant_id, romaneio.id).await?;
        Ok(RomaneioDetalhe { romaneio, itens })
    }

    // --- GERAR (rascunho) ---
    pub async fn generate<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        comprador_user_id: Uuid,
        payload: &GenerateRomaneioPayload,
    ) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.itens.is_empty() {
            return Err(AppError::business("O romaneio precisa de pelo menos um item"));
        }

        let mut tx = executor.begin().await?;

        let lojas: BTreeSet<Uuid> = payload.itens.iter().map(|i| i.loja_id).collect();
        for loja_id in lojas {
            self.cadastros.exigir(&mut *tx, tenant_id, Cadastro::Loja, loja_id).await?;
        }

        let produtos: BTreeSet<Uuid> = payload.itens.iter().map(|i| i.produto_id).collect();
        for produto_id in produtos {
            self.cadastros.exigir(&mut *tx, tenant_id, Cadastro::Produto, produto_id).await?;
        }

        // linha de compra só do próprio tenant
        let compra_itens: BTreeSet<Uuid> =
            payload.itens.iter().filter_map(|i| i.compra_item_id).collect();
        for compra_item_id in compra_itens {
            if !self.repo.compra_item_exists(&mut *tx, tenant_id, compra_item_id).await? {
                return Err(AppError::not_found("Item de compra não encontrado"));
            }
        }

        let romaneio = self
            .repo
            .insert(
                &mut *tx,
                tenant_id,
                comprador_user_id,
                payload.data_romaneio.unwrap_or_else(Utc::now),
                payload.observacoes.as_deref(),
            )
            .await?;

        let mut itens = Vec::with_capacity(payload.itens.len());
        for item in &payload.itens {
            itens.push(self.repo.insert_item(&mut *tx, tenant_id, romaneio.id, item).await?);
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            romaneio_id = %romaneio.id,
            itens = itens.len(),
            "Romaneio gerado"
        );

        Ok(RomaneioDetalhe { romaneio, itens })
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let romaneio = self.find(&mut *tx, tenant_id, id).await?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, romaneio).await?;
        tx.commit().await?;
        Ok(detalhe)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filters: &RomaneioFilters,
        page: &PageParams,
    ) -> Result<Paginated<Romaneio>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total = self.repo.count(&mut *tx, tenant_id, filters).await?;
        let romaneios = self.repo.list(&mut *tx, tenant_id, filters, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(romaneios, page, total))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateRomaneioPayload,
    ) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.is_empty() {
            return Err(AppError::business("Nenhum campo informado para atualização"));
        }

        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        atual.status.apply(Transition::Edit)?;

        let romaneio = RomaneioStatus::confirm(
            self.repo.update_rascunho(&mut *tx, tenant_id, id, payload).await?,
            Transition::Edit,
        )?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, romaneio).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, romaneio_id = %id, "Romaneio atualizado");
        Ok(detalhe)
    }

    // --- FINALIZAR ---
    // rascunho -> finalizado; um título a receber por loja e a saída das
    // embalagens para cada linha com embalagem. Tudo na mesma transação.
    pub async fn finalize<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        let novo_status = atual.status.apply(Transition::Complete)?;

        // status primeiro; nada é emitido se outra chamada já finalizou
        let romaneio = RomaneioStatus::confirm(
            self.repo
                .transition_status(&mut *tx, tenant_id, id, RomaneioStatus::OPEN, novo_status)
                .await?,
            Transition::Complete,
        )?;

        let itens = self.repo.list_itens(&mut *tx, tenant_id, id).await?;
        let vencimento = vencimento_padrao(Utc::now());

        let grupos = agrupar_por_loja(&itens);
        for grupo in &grupos {
            self.financeiro
                .emitir_titulo_loja(
                    &mut *tx,
                    tenant_id,
                    &NovoTituloLoja {
                        tipo: TituloTipo::Receber,
                        loja_id: grupo.loja_id,
                        romaneio_id: Some(id),
                        devolucao_id: None,
                        valor_principal: grupo.valor_principal,
                        valor_depositos: grupo.valor_depositos,
                        data_vencimento: vencimento,
                        observacoes: None,
                    },
                )
                .await?;
        }

        let mut movimentos = 0usize;
        for item in &itens {
            let Some(embalagem_id) = item.embalagem_id else { continue };
            if item.quantidade_embalagens <= 0 {
                continue;
            }

            let movimento = NovoMovimento {
                loja_id: item.loja_id,
                embalagem_id,
                tipo: MovimentoTipo::Saida,
                quantidade: item.quantidade_embalagens,
                valor_deposito: item.valor_deposito_total,
                referencia_tipo: ReferenciaTipo::Romaneio,
                referencia_id: Some(id),
                observacoes: None,
            };
            self.embalagens.aplicar_movimento(&mut *tx, tenant_id, &movimento).await?;
            movimentos += 1;
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            romaneio_id = %id,
            titulos = grupos.len(),
            movimentos,
            "Romaneio finalizado"
        );

        Ok(RomaneioDetalhe { romaneio, itens })
    }

    // --- CANCELAR: rascunho -> cancelado ---
    pub async fn cancel<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<RomaneioDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let atual = self.find(&mut *tx, tenant_id, id).await?;
        let novo_status = atual.status.apply(Transition::Cancel)?;

        let romaneio = RomaneioStatus::confirm(
            self.repo
                .transition_status(&mut *tx, tenant_id, id, RomaneioStatus::OPEN, novo_status)
                .await?,
            Transition::Cancel,
        )?;
        let detalhe = self.detalhe(&mut *tx, tenant_id, romaneio).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, romaneio_id = %id, "Romaneio cancelado");
        Ok(detalhe)
    }
}
