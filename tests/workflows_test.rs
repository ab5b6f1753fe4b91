// Fluxos completos contra PostgreSQL: `DATABASE_URL=... cargo test -- --ignored`

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use ceasa_backend::{
    common::{error::AppError, pagination::PageParams},
    models::{
        compras::{CompraStatus, CreateCompraPayload},
        devolucoes::{CreateDevolucaoPayload, DevolucaoStatus},
        embalagens::{AjustePayload, MovimentoFilters, MovimentoTipo, ReferenciaTipo, SaldoFilters},
        financeiro::{BaixaPayload, TituloFilters, TituloOrigem, TituloResolvido, TituloStatus, TituloTipo},
        romaneios::{GenerateRomaneioPayload, RomaneioStatus},
    },
};
use common::{cenario, Cenario};

fn compra_payload(c: &Cenario) -> CreateCompraPayload {
    serde_json::from_value(json!({
        "fornecedorId": c.fornecedor_id,
        "itens": [
            { "produtoId": c.produto_id, "quantidadeTotal": 10, "precoUnitario": "5.00" },
            { "produtoId": c.produto_id, "quantidadeTotal": 3, "precoUnitario": "20.00" }
        ]
    }))
    .unwrap()
}

fn romaneio_payload(c: &Cenario) -> GenerateRomaneioPayload {
    serde_json::from_value(json!({
        "itens": [
            { "lojaId": c.loja_a, "produtoId": c.produto_id, "quantidade": 5, "precoUnitario": "2.00" },
            {
                "lojaId": c.loja_a, "produtoId": c.produto_id, "quantidade": 1, "precoUnitario": "2.00",
                "embalagemId": c.embalagem_id, "quantidadeEmbalagens": 2, "valorDepositoTotal": "10.00"
            },
            { "lojaId": c.loja_b, "produtoId": c.produto_id, "quantidade": 3, "precoUnitario": "4.00" }
        ]
    }))
    .unwrap()
}

fn devolucao_payload(c: &Cenario, romaneio_id: Option<Uuid>, tratamento: &str) -> CreateDevolucaoPayload {
    serde_json::from_value(json!({
        "lojaId": c.loja_a,
        "romaneioId": romaneio_id,
        "motivo": "Mercadoria avariada",
        "tratamento": tratamento,
        "itens": [{ "produtoId": c.produto_id, "quantidade": 2, "valorUnitario": "2.00" }]
    }))
    .unwrap()
}

fn pagina() -> PageParams {
    PageParams::new(1, 100)
}

async fn titulos_da_loja(c: &Cenario, loja_id: Uuid) -> Vec<ceasa_backend::models::financeiro::TituloLoja> {
    let mut tx = c.tx().await;
    let filtros = TituloFilters {
        tipo: Some(TituloOrigem::Loja),
        loja_id: Some(loja_id),
        ..Default::default()
    };
    let listagem = c.state.financeiro_service.list(&mut *tx, c.tenant_id, &filtros, &pagina()).await.unwrap();
    tx.commit().await.unwrap();
    listagem.titulos_loja.unwrap().data
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn purchase_conclusion_emits_one_payable_title() {
    let c = cenario().await;
    let servico = &c.state.compras_service;

    let mut tx = c.tx().await;
    let compra = servico.create(&mut *tx, c.tenant_id, c.user_id, &compra_payload(&c)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(compra.compra.valor_total, dec!(110.00));
    assert_eq!(compra.compra.status, CompraStatus::Pendente);
    assert!(compra.compra.numero.starts_with("COM-"));
    assert_eq!(compra.itens.len(), 2);

    let mut tx = c.tx().await;
    let concluida = servico.conclude(&mut *tx, c.tenant_id, compra.compra.id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(concluida.compra.status, CompraStatus::Concluida);

    let mut tx = c.tx().await;
    let filtros = TituloFilters { tipo: Some(TituloOrigem::Fornecedor), ..Default::default() };
    let titulos = c.state.financeiro_service.list(&mut *tx, c.tenant_id, &filtros, &pagina()).await.unwrap();
    tx.commit().await.unwrap();

    assert!(titulos.titulos_loja.is_none());
    let titulos = titulos.titulos_fornecedor.unwrap().data;
    assert_eq!(titulos.len(), 1);
    let titulo = &titulos[0];
    assert_eq!(titulo.tipo, TituloTipo::Pagar);
    assert_eq!(titulo.valor_principal, dec!(110.00));
    assert_eq!(titulo.compra_id, Some(compra.compra.id));
    assert_eq!(titulo.status, TituloStatus::Aberto);
    let prazo = titulo.data_vencimento - titulo.data_emissao;
    assert!((prazo - Duration::days(30)).num_minutes().abs() < 5);

    let mut tx = c.tx().await;
    let err = servico.conclude(&mut *tx, c.tenant_id, compra.compra.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn purchase_update_recomputes_total_and_delete_requires_pending() {
    let c = cenario().await;
    let servico = &c.state.compras_service;

    let mut tx = c.tx().await;
    let compra = servico.create(&mut *tx, c.tenant_id, c.user_id, &compra_payload(&c)).await.unwrap();
    let update = serde_json::from_value(json!({ "descontos": "10.00", "acrescimos": "2.50" })).unwrap();
    let atualizada = servico.update(&mut *tx, c.tenant_id, compra.compra.id, &update).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(atualizada.compra.valor_total, dec!(102.50));

    let mut tx = c.tx().await;
    servico.cancel(&mut *tx, c.tenant_id, compra.compra.id).await.unwrap();
    let err = servico.delete(&mut *tx, c.tenant_id, compra.compra.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    drop(tx);

    let mut tx = c.tx().await;
    let outra = servico.create(&mut *tx, c.tenant_id, c.user_id, &compra_payload(&c)).await.unwrap();
    servico.delete(&mut *tx, c.tenant_id, outra.compra.id).await.unwrap();
    let err = servico.get(&mut *tx, c.tenant_id, outra.compra.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn purchase_total_survives_an_update_of_notes_only() {
    let c = cenario().await;
    let servico = &c.state.compras_service;
    let payload: CreateCompraPayload = serde_json::from_value(json!({
        "fornecedorId": c.fornecedor_id,
        "itens": [
            { "produtoId": c.produto_id, "quantidadeTotal": "0.333", "precoUnitario": "1.00" },
            { "produtoId": c.produto_id, "quantidadeTotal": "0.333", "precoUnitario": "1.00" },
            { "produtoId": c.produto_id, "quantidadeTotal": "0.333", "precoUnitario": "1.00" }
        ]
    }))
    .unwrap();

    let mut tx = c.tx().await;
    let compra = servico.create(&mut *tx, c.tenant_id, c.user_id, &payload).await.unwrap();
    let update = serde_json::from_value(json!({ "observacoes": "conferido" })).unwrap();
    let atualizada = servico.update(&mut *tx, c.tenant_id, compra.compra.id, &update).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(compra.compra.valor_total, dec!(0.99));
    assert_eq!(atualizada.compra.valor_total, compra.compra.valor_total);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn concurrent_conclusions_emit_a_single_payable_title() {
    let c = cenario().await;

    let mut tx = c.tx().await;
    let compra = c.state.compras_service.create(&mut *tx, c.tenant_id, c.user_id, &compra_payload(&c)).await.unwrap();
    tx.commit().await.unwrap();

    let concluir = || async {
        let mut tx = c.tx().await;
        let r = c.state.compras_service.conclude(&mut *tx, c.tenant_id, compra.compra.id).await?;
        tx.commit().await?;
        Ok::<_, AppError>(r)
    };
    let (primeira, segunda) = tokio::join!(concluir(), concluir());

    let sucessos = [primeira.is_ok(), segunda.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(sucessos, 1);
    for r in [primeira, segunda] {
        if let Err(err) = r {
            assert!(matches!(err, AppError::BusinessRule(_)));
        }
    }

    let mut tx = c.tx().await;
    let filtros = TituloFilters { tipo: Some(TituloOrigem::Fornecedor), ..Default::default() };
    let titulos = c.state.financeiro_service.list(&mut *tx, c.tenant_id, &filtros, &pagina()).await.unwrap();
    assert_eq!(titulos.titulos_fornecedor.unwrap().pagination.total, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn purchase_with_unknown_supplier_is_not_found() {
    let c = cenario().await;
    let mut payload = compra_payload(&c);
    payload.fornecedor_id = Uuid::new_v4();

    let mut tx = c.tx().await;
    let err = c.state.compras_service.create(&mut *tx, c.tenant_id, c.user_id, &payload).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn manifest_finalization_fans_out_titles_and_packaging() {
    let c = cenario().await;
    let servico = &c.state.romaneios_service;

    let mut tx = c.tx().await;
    let romaneio = servico.generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c)).await.unwrap();
    let finalizado = servico.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(finalizado.romaneio.status, RomaneioStatus::Finalizado);

    let titulos_a = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos_a.len(), 1);
    assert_eq!(titulos_a[0].tipo, TituloTipo::Receber);
    assert_eq!(titulos_a[0].valor_principal, dec!(12.00));
    assert_eq!(titulos_a[0].valor_depositos, dec!(10.00));
    assert_eq!(titulos_a[0].valor_total, dec!(22.00));

    let titulos_b = titulos_da_loja(&c, c.loja_b).await;
    assert_eq!(titulos_b.len(), 1);
    assert_eq!(titulos_b[0].valor_principal, dec!(12.00));
    assert_eq!(titulos_b[0].valor_depositos, Decimal::ZERO);
    assert_eq!(titulos_b[0].valor_total, dec!(12.00));

    let mut tx = c.tx().await;
    let movimentos = c
        .state
        .embalagens_service
        .list_movimentos(&mut *tx, c.tenant_id, &MovimentoFilters::default(), &pagina())
        .await
        .unwrap();
    let saldos = c
        .state
        .embalagens_service
        .list_saldos(&mut *tx, c.tenant_id, &SaldoFilters { loja_id: Some(c.loja_a), ..Default::default() }, &pagina())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(movimentos.data.len(), 1);
    let movimento = &movimentos.data[0];
    assert_eq!(movimento.tipo, MovimentoTipo::Saida);
    assert_eq!(movimento.quantidade, 2);
    assert_eq!(movimento.valor_deposito_total, dec!(10.00));
    assert_eq!(movimento.referencia_tipo, ReferenciaTipo::Romaneio);
    assert_eq!(movimento.referencia_id, Some(romaneio.romaneio.id));

    assert_eq!(saldos.data.len(), 1);
    assert_eq!(saldos.data[0].saldo_quantidade, 2);
    assert_eq!(saldos.data[0].saldo_deposito, dec!(10.00));

    // segunda finalização não emite nada
    let mut tx = c.tx().await;
    let err = servico.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    drop(tx);
    assert_eq!(titulos_da_loja(&c, c.loja_a).await.len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn concurrent_finalizations_fan_out_only_once() {
    let c = cenario().await;

    let mut tx = c.tx().await;
    let romaneio = c
        .state
        .romaneios_service
        .generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let finalizar = || async {
        let mut tx = c.tx().await;
        let r = c.state.romaneios_service.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await?;
        tx.commit().await?;
        Ok::<_, AppError>(r)
    };
    let (primeira, segunda) = tokio::join!(finalizar(), finalizar());
    assert_eq!([primeira.is_ok(), segunda.is_ok()].iter().filter(|ok| **ok).count(), 1);

    assert_eq!(titulos_da_loja(&c, c.loja_a).await.len(), 1);
    assert_eq!(titulos_da_loja(&c, c.loja_b).await.len(), 1);

    let mut tx = c.tx().await;
    let saldos = c
        .state
        .embalagens_service
        .list_saldos(&mut *tx, c.tenant_id, &SaldoFilters { loja_id: Some(c.loja_a), ..Default::default() }, &pagina())
        .await
        .unwrap();
    assert_eq!(saldos.data[0].saldo_quantidade, 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn manifest_cannot_use_purchase_lines_of_another_tenant() {
    let a = cenario().await;
    let b = cenario().await;

    let mut tx = b.tx().await;
    let compra_b = b.state.compras_service.create(&mut *tx, b.tenant_id, b.user_id, &compra_payload(&b)).await.unwrap();
    tx.commit().await.unwrap();

    let payload: GenerateRomaneioPayload = serde_json::from_value(json!({
        "itens": [{
            "lojaId": a.loja_a, "produtoId": a.produto_id, "quantidade": 1, "precoUnitario": "2.00",
            "compraItemId": compra_b.itens[0].id
        }]
    }))
    .unwrap();

    let mut tx = a.tx().await;
    let err = a.state.romaneios_service.generate(&mut *tx, a.tenant_id, a.user_id, &payload).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
    drop(tx);

    // a compra de B continua só dela
    let mut tx = b.tx().await;
    b.state.compras_service.delete(&mut *tx, b.tenant_id, compra_b.compra.id).await.unwrap();
    tx.commit().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn cancelled_manifest_has_no_side_effects() {
    let c = cenario().await;
    let servico = &c.state.romaneios_service;

    let mut tx = c.tx().await;
    let romaneio = servico.generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c)).await.unwrap();
    let cancelado = servico.cancel(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(cancelado.romaneio.status, RomaneioStatus::Cancelado);
    assert!(titulos_da_loja(&c, c.loja_a).await.is_empty());

    let mut tx = c.tx().await;
    let err = servico.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn packaging_adjustments_keep_balance_equal_to_movement_sum() {
    let c = cenario().await;
    let servico = &c.state.embalagens_service;

    let ajuste = |tipo: &str, quantidade: i32, deposito: &str| -> AjustePayload {
        serde_json::from_value(json!({
            "lojaId": c.loja_b, "embalagemId": c.embalagem_id,
            "tipo": tipo, "quantidade": quantidade, "valorDeposito": deposito
        }))
        .unwrap()
    };

    let mut tx = c.tx().await;
    servico.adjust(&mut *tx, c.tenant_id, ajuste("saida", 5, "25.00")).await.unwrap();
    servico.adjust(&mut *tx, c.tenant_id, ajuste("entrada", 2, "10.00")).await.unwrap();
    let resultado = servico.adjust(&mut *tx, c.tenant_id, ajuste("ajuste", -1, "-5.00")).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(resultado.saldo.saldo_quantidade, 2);
    assert_eq!(resultado.saldo.saldo_deposito, dec!(10.00));
    assert_eq!(resultado.movimento.referencia_tipo, ReferenciaTipo::AjusteManual);

    let mut tx = c.tx().await;
    let movimentos = servico
        .list_movimentos(
            &mut *tx,
            c.tenant_id,
            &MovimentoFilters { loja_id: Some(c.loja_b), ..Default::default() },
            &pagina(),
        )
        .await
        .unwrap();
    let soma_qtd: i32 = movimentos.data.iter().map(|m| m.delta_quantidade).sum();
    let soma_dep: Decimal = movimentos.data.iter().map(|m| m.delta_deposito).sum();
    assert_eq!(soma_qtd, resultado.saldo.saldo_quantidade);
    assert_eq!(soma_dep, resultado.saldo.saldo_deposito);

    let err = servico.adjust(&mut *tx, c.tenant_id, ajuste("entrada", 0, "0")).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let mut desconhecida = ajuste("saida", 1, "0");
    desconhecida.embalagem_id = Uuid::new_v4();
    let err = servico.adjust(&mut *tx, c.tenant_id, desconhecida).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn credit_return_emits_payable_store_title() {
    let c = cenario().await;
    let servico = &c.state.devolucoes_service;

    let mut tx = c.tx().await;
    let devolucao = servico.create(&mut *tx, c.tenant_id, None, &devolucao_payload(&c, None, "credito")).await.unwrap();
    assert_eq!(devolucao.devolucao.valor_total, dec!(4.00));
    let processada = servico.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(processada.devolucao.status, DevolucaoStatus::Processada);

    let titulos = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos.len(), 1);
    assert_eq!(titulos[0].tipo, TituloTipo::Pagar);
    assert_eq!(titulos[0].devolucao_id, Some(devolucao.devolucao.id));
    assert_eq!(titulos[0].valor_total, dec!(4.00));

    let mut tx = c.tx().await;
    let err = servico.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    let err = servico.cancel(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn refund_return_decrements_manifest_receivable() {
    let c = cenario().await;

    let mut tx = c.tx().await;
    let romaneio = c
        .state
        .romaneios_service
        .generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c))
        .await
        .unwrap();
    c.state.romaneios_service.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap();

    let payload = devolucao_payload(&c, Some(romaneio.romaneio.id), "estorno");
    let devolucao = c.state.devolucoes_service.create(&mut *tx, c.tenant_id, None, &payload).await.unwrap();
    c.state.devolucoes_service.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap();
    tx.commit().await.unwrap();

    let titulos = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos.len(), 1);
    // principal 12.00 - 4.00 da devolução; depósitos intactos
    assert_eq!(titulos[0].valor_principal, dec!(8.00));
    assert_eq!(titulos[0].valor_depositos, dec!(10.00));
    assert_eq!(titulos[0].valor_total, dec!(18.00));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn refund_return_larger_than_the_receivable_is_rejected() {
    let c = cenario().await;

    let mut tx = c.tx().await;
    let romaneio = c
        .state
        .romaneios_service
        .generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c))
        .await
        .unwrap();
    c.state.romaneios_service.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap();

    let payload: CreateDevolucaoPayload = serde_json::from_value(json!({
        "lojaId": c.loja_a,
        "romaneioId": romaneio.romaneio.id,
        "motivo": "Carga inteira recusada",
        "tratamento": "estorno",
        "itens": [{ "produtoId": c.produto_id, "quantidade": 10, "valorUnitario": "2.00" }]
    }))
    .unwrap();
    let devolucao = c.state.devolucoes_service.create(&mut *tx, c.tenant_id, None, &payload).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = c.tx().await;
    let err = c.state.devolucoes_service.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    drop(tx);

    let titulos = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos[0].valor_principal, dec!(12.00));
    assert_eq!(titulos[0].valor_total, dec!(22.00));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn refund_return_without_manifest_changes_no_title() {
    let c = cenario().await;

    // título da loja A vindo de um romaneio, que não pode ser tocado
    let mut tx = c.tx().await;
    let romaneio = c
        .state
        .romaneios_service
        .generate(&mut *tx, c.tenant_id, c.user_id, &romaneio_payload(&c))
        .await
        .unwrap();
    c.state.romaneios_service.finalize(&mut *tx, c.tenant_id, romaneio.romaneio.id).await.unwrap();

    let devolucao = c
        .state
        .devolucoes_service
        .create(&mut *tx, c.tenant_id, None, &devolucao_payload(&c, None, "estorno"))
        .await
        .unwrap();
    let processada = c.state.devolucoes_service.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(processada.devolucao.status, DevolucaoStatus::Processada);
    let titulos = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos.len(), 1);
    assert_eq!(titulos[0].tipo, TituloTipo::Receber);
    assert_eq!(titulos[0].valor_principal, dec!(12.00));
    assert_eq!(titulos[0].valor_total, dec!(22.00));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn return_total_is_the_same_at_creation_and_processing() {
    let c = cenario().await;
    let payload: CreateDevolucaoPayload = serde_json::from_value(json!({
        "lojaId": c.loja_a,
        "motivo": "Peso abaixo do combinado",
        "tratamento": "credito",
        "itens": [
            { "produtoId": c.produto_id, "quantidade": "0.333", "valorUnitario": "1.00" },
            { "produtoId": c.produto_id, "quantidade": "0.333", "valorUnitario": "1.00" },
            { "produtoId": c.produto_id, "quantidade": "0.333", "valorUnitario": "1.00" }
        ]
    }))
    .unwrap();

    let mut tx = c.tx().await;
    let criada = c.state.devolucoes_service.create(&mut *tx, c.tenant_id, None, &payload).await.unwrap();
    let processada = c.state.devolucoes_service.process(&mut *tx, c.tenant_id, criada.devolucao.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(criada.devolucao.valor_total, dec!(0.99));
    assert_eq!(processada.devolucao.valor_total, criada.devolucao.valor_total);
    let soma_itens: Decimal = criada.itens.iter().map(|i| i.valor_total).sum();
    assert_eq!(soma_itens, criada.devolucao.valor_total);

    let titulos = titulos_da_loja(&c, c.loja_a).await;
    assert_eq!(titulos[0].valor_total, dec!(0.99));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn exchange_return_has_no_financial_effect() {
    let c = cenario().await;

    let mut tx = c.tx().await;
    let devolucao = c
        .state
        .devolucoes_service
        .create(&mut *tx, c.tenant_id, None, &devolucao_payload(&c, None, "troca"))
        .await
        .unwrap();
    c.state.devolucoes_service.process(&mut *tx, c.tenant_id, devolucao.devolucao.id).await.unwrap();
    tx.commit().await.unwrap();

    assert!(titulos_da_loja(&c, c.loja_a).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn returns_are_limited_to_allowed_stores() {
    let c = cenario().await;
    let servico = &c.state.devolucoes_service;
    let so_loja_b = [c.loja_b];

    let mut tx = c.tx().await;
    let err = servico
        .create(&mut *tx, c.tenant_id, Some(&so_loja_b), &devolucao_payload(&c, None, "credito"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let devolucao = servico.create(&mut *tx, c.tenant_id, None, &devolucao_payload(&c, None, "credito")).await.unwrap();
    let listagem = servico
        .list(&mut *tx, c.tenant_id, Some(&so_loja_b), &Default::default(), &pagina())
        .await
        .unwrap();
    assert_eq!(listagem.pagination.total, 0);

    let err = servico.get(&mut *tx, c.tenant_id, Some(&so_loja_b), devolucao.devolucao.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn title_settle_reverse_and_cancel() {
    let c = cenario().await;
    let financeiro = &c.state.financeiro_service;

    let mut tx = c.tx().await;
    let compra = c.state.compras_service.create(&mut *tx, c.tenant_id, c.user_id, &compra_payload(&c)).await.unwrap();
    c.state.compras_service.conclude(&mut *tx, c.tenant_id, compra.compra.id).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = c.tx().await;
    let filtros = TituloFilters { tipo: Some(TituloOrigem::Fornecedor), ..Default::default() };
    let titulo_id = financeiro
        .list(&mut *tx, c.tenant_id, &filtros, &pagina())
        .await
        .unwrap()
        .titulos_fornecedor
        .unwrap()
        .data[0]
        .id;

    let pago = financeiro.settle(&mut *tx, c.tenant_id, titulo_id, &BaixaPayload::default()).await.unwrap();
    assert_eq!(pago.status(), TituloStatus::Pago);
    match &pago {
        TituloResolvido::Fornecedor(t) => assert!(t.data_pagamento.is_some_and(|d| d <= Utc::now())),
        TituloResolvido::Loja(_) => panic!("título deveria ser de fornecedor"),
    }

    let err = financeiro.settle(&mut *tx, c.tenant_id, titulo_id, &BaixaPayload::default()).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let reaberto = financeiro.reverse(&mut *tx, c.tenant_id, titulo_id).await.unwrap();
    assert_eq!(reaberto.status(), TituloStatus::Aberto);
    if let TituloResolvido::Fornecedor(t) = &reaberto {
        assert!(t.data_pagamento.is_none());
    }

    let cancelado = financeiro.cancel_title(&mut *tx, c.tenant_id, titulo_id).await.unwrap();
    assert_eq!(cancelado.status(), TituloStatus::Cancelado);

    let err = financeiro.reverse(&mut *tx, c.tenant_id, titulo_id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let err = financeiro.resolve(&mut *tx, c.tenant_id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}
