use dashboard_core::ListView;
use shared::domain::{Activity, ClientProfile};

pub trait TableRow {
    fn cells(&self) -> Vec<String>;
}

impl TableRow for Activity {
    fn cells(&self) -> Vec<String> {
        let client = self
            .client
            .as_ref()
            .map(|client| client.full_name.clone())
            .unwrap_or_else(|| "-".to_string());
        vec![
            self.scheduled_at.format("%-d %B %Y at %H.%M").to_string(),
            client,
            self.status_label().to_string(),
            self.id.to_string(),
        ]
    }
}

impl TableRow for ClientProfile {
    fn cells(&self) -> Vec<String> {
        let category = self
            .client_category
            .as_ref()
            .map(|category| category.name.clone())
            .unwrap_or_else(|| "-".to_string());
        vec![
            self.full_name.clone(),
            self.company.clone(),
            self.email.clone(),
            category,
            self.id.to_string(),
        ]
    }
}

pub fn render_table<T: TableRow>(view: &ListView<T>) -> String {
    let mut out = String::new();
    if view.rows.is_empty() {
        out.push_str("No results.\n");
    }
    for (number, row) in view.numbered_rows() {
        out.push_str(&format!("{number:>4}  {}\n", row.cells().join("  |  ")));
    }
    out.push_str(&view.range_label());
    if view.page_count() > 1 {
        out.push_str(&format!(
            "  (page {} of {})",
            view.query.page_index + 1,
            view.page_count()
        ));
    }
    out.push('\n');
    out
}
