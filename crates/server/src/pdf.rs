//! Proposal document rendering.
//!
//! A [`ProposalRenderer`] pours a fully resolved `ProposalView` into the
//! HTML template and, when wkhtmltopdf is reachable, converts the result
//! to PDF. Without a converter the HTML itself is written out, so a
//! proposal document always exists after a successful render.

use std::path::PathBuf;
use std::process::Stdio;

use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};
use uuid::Uuid;

use roofline_core::domain::quote::QuoteId;
use roofline_core::proposal::{proposal_file_name, ProposalView};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedProposal {
    pub file_name: String,
    /// "pdf" or "html" depending on converter availability.
    pub extension: &'static str,
}

pub struct ProposalRenderer {
    tera: Tera,
    output_dir: PathBuf,
    wkhtmltopdf_path: Option<String>,
}

impl ProposalRenderer {
    /// `explicit_converter` pins the wkhtmltopdf binary; otherwise it is
    /// discovered on PATH.
    pub fn new(
        output_dir: PathBuf,
        explicit_converter: Option<&str>,
    ) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template("proposal.html", include_str!("../../../templates/proposal.html.tera"))
            .map_err(|e| RenderError::Template(e.to_string()))?;

        let wkhtmltopdf_path = match explicit_converter {
            Some(path) => Some(path.to_string()),
            None => which::which("wkhtmltopdf").ok().map(|p| p.to_string_lossy().to_string()),
        };

        match &wkhtmltopdf_path {
            Some(path) => info!(path = %path, "wkhtmltopdf found, proposals render as PDF"),
            None => warn!("wkhtmltopdf not found, proposals render as HTML"),
        }

        Ok(Self { tera, output_dir, wkhtmltopdf_path })
    }

    #[cfg(test)]
    fn without_converter(output_dir: PathBuf) -> Self {
        let mut renderer = Self::new(output_dir, None).expect("renderer");
        renderer.wkhtmltopdf_path = None;
        renderer
    }

    /// Renders the view and writes the document under the output
    /// directory. Returns the file name, never a path outside it.
    pub async fn render(
        &self,
        quote_id: QuoteId,
        view: &ProposalView,
    ) -> Result<RenderedProposal, RenderError> {
        let mut context = Context::new();
        context.insert("proposal", view);
        let html = self
            .tera
            .render("proposal.html", &context)
            .map_err(|e| RenderError::Template(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let token = render_token();

        if let Some(converter) = &self.wkhtmltopdf_path {
            match self.convert_html_to_pdf(&html, converter).await {
                Ok(pdf_bytes) => {
                    let file_name = proposal_file_name(quote_id, &token, "pdf");
                    tokio::fs::write(self.output_dir.join(&file_name), pdf_bytes).await?;
                    return Ok(RenderedProposal { file_name, extension: "pdf" });
                }
                Err(e) => {
                    warn!(error = %e, quote_id = quote_id.0, "PDF conversion failed, falling back to HTML");
                }
            }
        }

        let file_name = proposal_file_name(quote_id, &token, "html");
        tokio::fs::write(self.output_dir.join(&file_name), html).await?;
        Ok(RenderedProposal { file_name, extension: "html" })
    }

    async fn convert_html_to_pdf(
        &self,
        html: &str,
        converter: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let temp_dir = std::env::temp_dir();
        let stem = Uuid::new_v4().simple().to_string();
        let html_path = temp_dir.join(format!("proposal_{stem}.html"));
        let pdf_path = temp_dir.join(format!("proposal_{stem}.pdf"));

        tokio::fs::write(&html_path, html).await?;

        let output = Command::new(converter)
            .arg("--page-size")
            .arg("A4")
            .arg("--margin-top")
            .arg("10mm")
            .arg("--margin-bottom")
            .arg("10mm")
            .arg("--margin-left")
            .arg("10mm")
            .arg("--margin-right")
            .arg("10mm")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "wkhtmltopdf failed");
            let _ = tokio::fs::remove_file(&html_path).await;
            return Err(RenderError::Conversion(stderr.to_string()));
        }

        let pdf_bytes = tokio::fs::read(&pdf_path).await?;
        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;

        info!(size = pdf_bytes.len(), "proposal PDF generated");
        Ok(pdf_bytes)
    }
}

fn render_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use roofline_core::domain::lead::{Lead, LeadId, LeadSource, LeadStatus};
    use roofline_core::domain::measurement::{Measurement, RoofComplexity};
    use roofline_core::domain::quote::{Quote, QuoteId};
    use roofline_core::domain::tenant::{
        Branding, ContractorProfile, PricingConfig, ProposalTemplate, TenantConfigSnapshot,
        TenantId, TierKey,
    };
    use roofline_core::proposal::ProposalView;

    use super::ProposalRenderer;

    fn view() -> ProposalView {
        view_with_template(ProposalTemplate::default())
    }

    fn view_with_template(template: ProposalTemplate) -> ProposalView {
        let config = TenantConfigSnapshot {
            profile: ContractorProfile {
                id: TenantId(1),
                company_name: "Summit Roofing".to_string(),
                email: "office@summitroofing.example".to_string(),
                phone: Some("555-0100".to_string()),
                address: Some("800 Main St, Dallas TX".to_string()),
                website: None,
                widget_id: "wgt-summit".to_string(),
            },
            pricing: PricingConfig::default(),
            branding: Branding::default(),
            template,
        };
        let lead = Lead {
            id: LeadId(7),
            tenant_id: TenantId(1),
            name: "Jordan Alvarez".to_string(),
            email: "jordan@example.com".to_string(),
            phone: None,
            address: "123 Oak St, Dallas TX".to_string(),
            status: LeadStatus::default(),
            source: LeadSource::default(),
            notes: None,
            created_at: Utc::now(),
        };
        let base = Decimal::new(2_187_500, 2);
        let removal = Decimal::new(375_000, 2);
        let permit = Decimal::new(35_000, 2);
        let quote = Quote {
            id: QuoteId(42),
            lead_id: LeadId(7),
            address: "123 Oak St, Dallas TX".to_string(),
            measurement: Measurement::new(Decimal::new(2_500, 0), RoofComplexity::Moderate, "6/12"),
            selected_tier: TierKey::Better,
            base_price: base,
            removal_cost: removal,
            permit_cost: permit,
            total_price: base + removal + permit,
            document_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().expect("timestamp"),
        };
        ProposalView::build(&quote, &lead, &config)
    }

    #[tokio::test]
    async fn renders_html_file_when_converter_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = ProposalRenderer::without_converter(dir.path().to_path_buf());

        let rendered = renderer.render(QuoteId(42), &view()).await.expect("render");

        assert_eq!(rendered.extension, "html");
        assert!(rendered.file_name.starts_with("proposal_42_"));
        assert!(rendered.file_name.ends_with(".html"));

        let html =
            std::fs::read_to_string(dir.path().join(&rendered.file_name)).expect("read file");
        assert!(html.contains("00042"));
        assert!(html.contains("Summit Roofing"));
        assert!(html.contains("$25,975.00"));
        assert!(html.contains("Old Roof Removal"));
    }

    #[tokio::test]
    async fn warranty_term_renders_even_with_coverage_panel_disabled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = ProposalRenderer::without_converter(dir.path().to_path_buf());
        let template = ProposalTemplate { show_warranty: false, ..ProposalTemplate::default() };

        let rendered =
            renderer.render(QuoteId(42), &view_with_template(template)).await.expect("render");

        let html =
            std::fs::read_to_string(dir.path().join(&rendered.file_name)).expect("read file");
        // The selected tier's warranty term is part of the project
        // details; only the coverage blurb is optional.
        assert!(html.contains("30-year"));
        assert!(!html.contains("workmanship guarantee"));
    }

    #[tokio::test]
    async fn coverage_panel_carries_the_guarantee_blurb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = ProposalRenderer::without_converter(dir.path().to_path_buf());

        let rendered = renderer.render(QuoteId(42), &view()).await.expect("render");

        let html =
            std::fs::read_to_string(dir.path().join(&rendered.file_name)).expect("read file");
        assert!(html.contains("30-year"));
        assert!(html.contains("workmanship guarantee"));
    }

    #[tokio::test]
    async fn repeated_renders_produce_distinct_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = ProposalRenderer::without_converter(dir.path().to_path_buf());

        let first = renderer.render(QuoteId(42), &view()).await.expect("render");
        let second = renderer.render(QuoteId(42), &view()).await.expect("render");

        assert_ne!(first.file_name, second.file_name);
        assert!(dir.path().join(&first.file_name).exists());
        assert!(dir.path().join(&second.file_name).exists());
    }
}
