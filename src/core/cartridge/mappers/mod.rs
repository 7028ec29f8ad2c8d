//! Implementations of various mappers used by NES cartridges.
//! See [Mapper][super::Mapper].
mod nrom;
pub use nrom::NRom;
mod sxrom;
pub use sxrom::SxRom;
mod uxrom;
pub use uxrom::UxRom;
mod cnrom;
pub use cnrom::CnRom;
mod txrom;
pub use txrom::TxRom;
mod axrom;
pub use axrom::AxRom;
