use crate::LedgerError;
use serde::{Deserialize, Serialize};

/// Imagen (QR o código de barras) producida para un código. El ledger nunca
/// inspecciona su contenido; `handle` suele ser una ruta de archivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeImage {
  pub code: String,
  pub handle: String,
}

/// Colaborador externo que dibuja el código serial impreso en el vale.
pub trait CodeRenderer {
  /// Dibuja `code` dentro de `folder` y devuelve el manejador de la imagen.
  fn render(&self, code: &str, folder: &str) -> Result<CodeImage, LedgerError>;
}
