//! Command-line configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use compliance_engine::{ComplianceEngine, ScoringStrategy};
use shared_pdf::{ExtractionLimits, LopdfDecoder, NoopPdfDecoder, PdfDecoder};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_RATE_LIMIT: u32 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Options shared by every command that runs the pipeline
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Scoring strategy: "weighted" or "density"
    #[arg(long, default_value_t = ScoringStrategy::Weighted)]
    pub strategy: ScoringStrategy,

    /// Disable PDF decoding; PDFs are analyzed from a raw byte preview
    #[arg(long)]
    pub no_pdf: bool,

    /// Maximum number of PDF pages decoded per document
    #[arg(long, default_value_t = shared_pdf::DEFAULT_MAX_PAGES)]
    pub max_pdf_pages: usize,

    /// Deepest array or dictionary nesting accepted in a PDF
    #[arg(long, default_value_t = shared_pdf::DEFAULT_MAX_NESTING_DEPTH)]
    pub max_pdf_nesting: usize,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Weighted,
            no_pdf: false,
            max_pdf_pages: shared_pdf::DEFAULT_MAX_PAGES,
            max_pdf_nesting: shared_pdf::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl EngineArgs {
    pub fn build_engine(&self) -> ComplianceEngine {
        let decoder: Arc<dyn PdfDecoder> = if self.no_pdf {
            Arc::new(NoopPdfDecoder)
        } else {
            Arc::new(LopdfDecoder::new(ExtractionLimits {
                max_pages: self.max_pdf_pages,
                max_nesting_depth: self.max_pdf_nesting,
            }))
        };

        ComplianceEngine::with_strategy(self.strategy).with_pdf_decoder(decoder)
    }
}

/// Options for the HTTP server
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            engine: EngineArgs::default(),
        }
    }
}

impl ServeArgs {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Options for one-off local analysis
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Document to analyze
    pub path: PathBuf,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_decodes_pdfs() {
        let engine = EngineArgs::default().build_engine();
        assert_eq!(engine.pdf_backend(), "lopdf");
        assert_eq!(engine.strategy(), ScoringStrategy::Weighted);
    }

    #[test]
    fn test_no_pdf_uses_noop_decoder() {
        let args = EngineArgs {
            no_pdf: true,
            strategy: ScoringStrategy::Density,
            ..EngineArgs::default()
        };
        let engine = args.build_engine();
        assert_eq!(engine.pdf_backend(), "none");
        assert_eq!(engine.lexicon().len(), 23);
    }

    #[test]
    fn test_socket_addr() {
        let args = ServeArgs::default();
        assert_eq!(args.socket_addr().unwrap().port(), DEFAULT_PORT);

        let bad = ServeArgs {
            host: "not a host".to_string(),
            ..ServeArgs::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
