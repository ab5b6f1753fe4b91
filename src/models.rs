pub mod auth;
pub mod compras;
pub mod devolucoes;
pub mod embalagens;
pub mod financeiro;
pub mod lifecycle;
pub mod romaneios;
