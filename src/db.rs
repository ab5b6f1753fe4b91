pub mod cadastros_repo;
pub use cadastros_repo::CadastrosRepository;
pub mod compras_repo;
pub use compras_repo::ComprasRepository;
pub mod romaneios_repo;
pub use romaneios_repo::RomaneiosRepository;
pub mod embalagens_repo;
pub use embalagens_repo::EmbalagensRepository;
pub mod devolucoes_repo;
pub use devolucoes_repo::DevolucoesRepository;
pub mod financeiro_repo;
pub use financeiro_repo::FinanceiroRepository;
