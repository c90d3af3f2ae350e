// employee.rs
use crate::schema;
use crate::{LedgerError, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Datos del formulario de registro de empleado.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeDraft {
  pub name: String,
  pub cedula: String,
  pub phone: String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
  name: String,
  cedula: String,
  phone: String,
  email: String,
  employee_id: String,
}

impl Employee {
  pub fn from_parts(name: &str, cedula: &str, phone: &str, email: &str, employee_id: &str) -> Self {
    Self { name: name.trim().to_string(),
           cedula: cedula.trim().to_string(),
           phone: phone.trim().to_string(),
           email: email.trim().to_string(),
           employee_id: employee_id.trim().to_string() }
  }

  /// Valida el formulario y genera el id del nuevo empleado. La unicidad de
  /// la cédula la verifica el registro contra la hoja de empleados.
  pub fn register(draft: &EmployeeDraft) -> Result<Self, LedgerError> {
    let name = draft.name.trim();
    if name.is_empty() {
      return Err(LedgerError::ValidationError("El nombre es obligatorio".to_string()));
    }
    if draft.cedula.trim().is_empty() {
      return Err(LedgerError::ValidationError("La cédula es obligatoria".to_string()));
    }
    if !validate_cedula(&draft.cedula) {
      return Err(LedgerError::ValidationError("La cédula debe contener solo números (6-12 dígitos)".to_string()));
    }
    let email = draft.email.trim();
    if !email.is_empty() && !email.contains('@') {
      return Err(LedgerError::ValidationError("El formato del correo electrónico no es válido".to_string()));
    }
    let cedula = normalize_cedula(&draft.cedula);
    let employee_id = generate_employee_id(&cedula);
    Ok(Self::from_parts(name, &cedula, &draft.phone, email, &employee_id))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn cedula(&self) -> &str {
    &self.cedula
  }

  pub fn phone(&self) -> &str {
    &self.phone
  }

  pub fn email(&self) -> &str {
    &self.email
  }

  pub fn employee_id(&self) -> &str {
    &self.employee_id
  }

  pub fn to_row(&self) -> Row {
    Row::new().with(schema::EMPLOYEE_NAME, self.name.as_str())
              .with(schema::EMPLOYEE_CEDULA, self.cedula.as_str())
              .with(schema::EMPLOYEE_PHONE, self.phone.as_str())
              .with(schema::EMPLOYEE_EMAIL, self.email.as_str())
              .with(schema::EMPLOYEE_KEY, self.employee_id.as_str())
  }

  /// Lee un empleado de su fila. Sin nombre o sin id la fila no es usable.
  pub fn from_row(row: &Row) -> Option<Self> {
    let name = row.text(schema::EMPLOYEE_NAME)?;
    let employee_id = row.text(schema::EMPLOYEE_KEY)?;
    Some(Self::from_parts(&name,
                          &row.text(schema::EMPLOYEE_CEDULA).unwrap_or_default(),
                          &row.text(schema::EMPLOYEE_PHONE).unwrap_or_default(),
                          &row.text(schema::EMPLOYEE_EMAIL).unwrap_or_default(),
                          &employee_id))
  }
}

impl fmt::Display for Employee {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.employee_id)
  }
}

/// Quita espacios y guiones de una cédula.
pub fn normalize_cedula(cedula: &str) -> String {
  cedula.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Una cédula válida tiene entre 6 y 12 dígitos, ignorando espacios y guiones.
pub fn validate_cedula(cedula: &str) -> bool {
  let clean = normalize_cedula(cedula);
  (6..=12).contains(&clean.len()) && clean.chars().all(|c| c.is_ascii_digit())
}

/// `E` + últimos 4 dígitos de la cédula + 4 caracteres aleatorios.
pub fn generate_employee_id(cedula: &str) -> String {
  employee_id_from(cedula, &Uuid::new_v4().simple().to_string())
}

/// Arma el id con los primeros 4 caracteres de `random`.
pub fn employee_id_from(cedula: &str, random: &str) -> String {
  let digits: Vec<char> = cedula.chars().collect();
  let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
  let random: String = random.chars().take(4).collect();
  format!("E{}{}", tail, random).to_uppercase()
}
