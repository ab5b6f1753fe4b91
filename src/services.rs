pub mod compras_service;
pub mod devolucoes_service;
pub mod embalagens_service;
pub mod financeiro_service;
pub mod romaneios_service;
