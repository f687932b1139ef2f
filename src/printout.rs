//! Printable voucher document, as plain text for the terminal and as HTML
//! for PDF conversion.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use std::fmt::Write as _;
use tera::{Context, Tera};

use crate::model::Voucher;

/// Element id of the printable region in the HTML document
pub const DOCUMENT_ELEMENT_ID: &str = "voucher-document";

const TEMPLATE_NAME: &str = "voucher.html";
const TEMPLATE: &str = include_str!("../templates/voucher.html");

/// Page and raster settings expected by the PDF conversion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
  pub format: &'static str,
  pub orientation: &'static str,
  pub margin_mm: u32,
  pub scale: u32,
  pub jpeg_quality: f32,
}

pub const PDF_OPTIONS: PdfOptions = PdfOptions {
  format: "a4",
  orientation: "portrait",
  margin_mm: 0,
  scale: 2,
  jpeg_quality: 0.98,
};

pub fn pdf_file_name(v: &Voucher) -> String {
  format!("Voucher_{}.pdf", v.voucher_number)
}

/// Date as dd/mm/yyyy, or the raw value if it isn't an ISO date
fn display_date(raw: &str) -> String {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map(|d| d.format("%d/%m/%Y").to_string())
    .unwrap_or_else(|_| raw.to_string())
}

pub fn render_text(v: &Voucher) -> String {
  let rule = "=".repeat(60);
  let mut out = String::new();

  let _ = writeln!(out, "{}", rule);
  let _ = writeln!(out, "Rent-a-Guide{:>48}", "WORK ORDER / VOUCHER");
  let _ = writeln!(out, "PROFESSIONAL GUIDE SERVICES{:>33}", format!("#{}", v.voucher_number));
  let _ = writeln!(out, "{}", rule);

  let fields = [
    ("TO", v.to.to_uppercase()),
    ("DATE", display_date(&v.date_of_service)),
    ("TIME", v.visit_time.clone().unwrap_or_else(|| "-".to_string())),
    ("TOUR NO.", v.tour_number.clone()),
    ("TRAVELERS", v.number_of_travelers.to_string()),
    ("SERVICE", v.service_type.clone()),
    ("GUIDE", v.guide_name.clone()),
  ];
  for (label, value) in fields {
    let _ = writeln!(out, "{:<14}{}", format!("{}:", label), value);
  }

  if !v.service_description.trim().is_empty() {
    let _ = writeln!(out, "DESCRIPTION:");
    for line in v.service_description.lines() {
      let _ = writeln!(out, "  {}", line);
    }
  }
  let _ = writeln!(out, "{}", rule);
  out
}

pub fn render_html(v: &Voucher) -> Result<String> {
  let mut tera = Tera::default();
  tera
    .add_raw_template(TEMPLATE_NAME, TEMPLATE)
    .map_err(|e| eyre!("Failed to load voucher template: {}", e))?;

  let mut context = Context::new();
  context.insert("voucher", v);
  context.insert("element_id", DOCUMENT_ELEMENT_ID);
  context.insert("date", &display_date(&v.date_of_service));
  context.insert("time", v.visit_time.as_deref().unwrap_or("-"));

  tera
    .render(TEMPLATE_NAME, &context)
    .map_err(|e| eyre!("Failed to render voucher #{}: {}", v.voucher_number, e))
}
