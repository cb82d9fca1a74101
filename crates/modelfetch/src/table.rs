use modelfetch_catalog::CatalogEntry;
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Formatter {
    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }
        if let Some(footer) = self.footer {
            table.with(Panel::footer(footer));
        }

        table.with(Style::blank());
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct EntryRow {
    #[tabled(rename = "NAME")]
    pub name:        String,
    #[tabled(rename = "SIZE")]
    pub size:        String,
    #[tabled(rename = "CHECKSUM")]
    pub checksum:    String,
    #[tabled(rename = "STATUS")]
    pub status:      String,
    #[tabled(rename = "DESTINATION")]
    pub destination: String,
}

impl EntryRow {
    pub fn is_present(&self) -> bool { self.status == "present" }
}

/// Footer line for `list`, or `None` when every entry is on disk.
pub fn missing_summary(rows: &[EntryRow]) -> Option<String> {
    let missing = rows.iter().filter(|row| !row.is_present()).count();
    (missing > 0).then(|| format!("{missing} of {} not yet fetched", rows.len()))
}

impl From<&CatalogEntry> for EntryRow {
    fn from(entry: &CatalogEntry) -> Self {
        let spec = &entry.spec;
        // Size check only.
        let status = match std::fs::metadata(&spec.destination) {
            Err(_) => "missing",
            Ok(meta) if !meta.is_file() => "not a file",
            Ok(meta) if spec.expected_size.is_some_and(|size| size != meta.len()) => "size mismatch",
            Ok(_) => "present",
        };

        Self {
            name:        entry.name.clone(),
            size:        spec.expected_size.map_or_else(|| "-".to_string(), |s| s.to_string()),
            checksum:    spec.expected_checksum.as_ref().map_or_else(|| "-".to_string(), ToString::to_string),
            status:      status.to_string(),
            destination: spec.destination.display().to_string(),
        }
    }
}
