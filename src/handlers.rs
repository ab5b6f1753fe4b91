pub mod compras;
pub mod devolucoes;
pub mod embalagens;
pub mod financeiro;
pub mod health;
pub mod romaneios;
