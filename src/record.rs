use duckdb::Row;
use serde::Serialize;

/// Column list shared by the lookup query and [`CitizenRecord::from_row`].
/// Order here is the order of the JSON object returned to clients.
pub const COLUMNS: &[&str] = &[
    "NUMERO_IDENTIDAD",
    "PRIMER_NOMBRE",
    "SEGUNDO_NOMBRE",
    "PRIMER_APELLIDO",
    "SEGUNDO_APELLIDO",
    "SEXO",
    "FECHA_NACIMIENTO",
    "Edad",
    "DEPARTAMENTO",
    "MUNICIPIO",
    "AREA",
    "SECTOR",
    "CODIGO_CENTRO",
    "NOMBRE_CENTRO",
];

/// Column read as an integer; every other column is read as text.
pub const AGE_COLUMN: &str = "Edad";

/// One row of the census file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitizenRecord {
    #[serde(rename = "NUMERO_IDENTIDAD")]
    pub numero_identidad: String,
    #[serde(rename = "PRIMER_NOMBRE")]
    pub primer_nombre: Option<String>,
    #[serde(rename = "SEGUNDO_NOMBRE")]
    pub segundo_nombre: Option<String>,
    #[serde(rename = "PRIMER_APELLIDO")]
    pub primer_apellido: Option<String>,
    #[serde(rename = "SEGUNDO_APELLIDO")]
    pub segundo_apellido: Option<String>,
    #[serde(rename = "SEXO")]
    pub sexo: Option<String>,
    /// Column rendered as text; a DATE column comes out as `YYYY-MM-DD`.
    #[serde(rename = "FECHA_NACIMIENTO")]
    pub fecha_nacimiento: Option<String>,
    #[serde(rename = "Edad")]
    pub edad: Option<i64>,
    #[serde(rename = "DEPARTAMENTO")]
    pub departamento: Option<String>,
    #[serde(rename = "MUNICIPIO")]
    pub municipio: Option<String>,
    #[serde(rename = "AREA")]
    pub area: Option<String>,
    #[serde(rename = "SECTOR")]
    pub sector: Option<String>,
    #[serde(rename = "CODIGO_CENTRO")]
    pub codigo_centro: Option<String>,
    #[serde(rename = "NOMBRE_CENTRO")]
    pub nombre_centro: Option<String>,
}

impl CitizenRecord {
    /// Build a record from a row whose columns follow [`COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            numero_identidad: row.get(0)?,
            primer_nombre: row.get(1)?,
            segundo_nombre: row.get(2)?,
            primer_apellido: row.get(3)?,
            segundo_apellido: row.get(4)?,
            sexo: row.get(5)?,
            fecha_nacimiento: row.get(6)?,
            edad: row.get(7)?,
            departamento: row.get(8)?,
            municipio: row.get(9)?,
            area: row.get(10)?,
            sector: row.get(11)?,
            codigo_centro: row.get(12)?,
            nombre_centro: row.get(13)?,
        })
    }
}
