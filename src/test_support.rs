//! Fixtures shared by the unit tests: a small census Parquet file and a
//! local HTTP server standing in for the object store.

use arrow::{
    array::{ArrayRef, Date32Array, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use url::Url;
use warp::{http::StatusCode, Filter};

pub(crate) const KNOWN_ID: &str = "00112233";
pub(crate) const OTHER_ID: &str = "00445566";

fn days_since_epoch(y: i32, m: u32, d: u32) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
    (date - epoch).num_days() as i32
}

/// Two-row census file; `KNOWN_ID` has no second given name.
pub(crate) fn sample_parquet() -> Vec<u8> {
    let text = |name: &str, nullable: bool| Field::new(name, DataType::Utf8, nullable);
    let schema = Arc::new(Schema::new(vec![
        text("NUMERO_IDENTIDAD", false),
        text("PRIMER_NOMBRE", true),
        text("SEGUNDO_NOMBRE", true),
        text("PRIMER_APELLIDO", true),
        text("SEGUNDO_APELLIDO", true),
        text("SEXO", true),
        Field::new("FECHA_NACIMIENTO", DataType::Date32, true),
        Field::new("Edad", DataType::Int32, true),
        text("DEPARTAMENTO", true),
        text("MUNICIPIO", true),
        text("AREA", true),
        text("SECTOR", true),
        text("CODIGO_CENTRO", true),
        text("NOMBRE_CENTRO", true),
    ]));

    let strings = |a: Option<&str>, b: Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(vec![a, b]))
    };
    let columns: Vec<ArrayRef> = vec![
        strings(Some(KNOWN_ID), Some(OTHER_ID)),
        strings(Some("ANA"), Some("JOSE")),
        strings(None, Some("LUIS")),
        strings(Some("LOPEZ"), Some("MEJIA")),
        strings(Some("CRUZ"), Some("REYES")),
        strings(Some("F"), Some("M")),
        Arc::new(Date32Array::from(vec![
            Some(days_since_epoch(1990, 5, 17)),
            Some(days_since_epoch(1975, 11, 2)),
        ])),
        Arc::new(Int32Array::from(vec![Some(35), Some(50)])),
        strings(Some("FRANCISCO MORAZAN"), Some("CORTES")),
        strings(Some("DISTRITO CENTRAL"), Some("SAN PEDRO SULA")),
        strings(Some("URBANA"), Some("RURAL")),
        strings(Some("001"), Some("014")),
        strings(Some("0801"), Some("0501")),
        strings(Some("ESCUELA REPUBLICA"), Some("INSTITUTO CENTRAL")),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    buf
}

pub(crate) fn write_sample(path: &Path) {
    std::fs::write(path, sample_parquet()).unwrap();
}

/// Local stand-in for the object store, counting every GET it serves.
pub(crate) struct MockRemote {
    pub url: Url,
    hits: Arc<AtomicUsize>,
}

impl MockRemote {
    pub async fn serving(status: StatusCode, body: Vec<u8>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let body = Arc::new(body);

        let route = warp::path("liberal.parquet").and(warp::get()).then(move || {
            let counter = counter.clone();
            let body = body.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // slow enough for concurrent callers to overlap
                tokio::time::sleep(Duration::from_millis(50)).await;
                warp::http::Response::builder()
                    .status(status)
                    .body(body.as_ref().clone())
            }
        });

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let url = Url::parse(&format!("http://{}/liberal.parquet", addr)).unwrap();
        Self { url, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A URL nothing listens on.
pub(crate) fn unreachable_url() -> Url {
    Url::parse("http://127.0.0.1:1/liberal.parquet").unwrap()
}
