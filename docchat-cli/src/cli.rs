//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docchat_rag::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, OllamaConfig, normalize_host};
use docchat_rag::{DEFAULT_GENERATION_MODEL, DEFAULT_TOP_K, RagConfig};

#[derive(Parser, Debug)]
#[command(name = "docchat", version, about = "Ask questions about a document using a local Ollama model")]
pub struct Cli {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the chunks a document would be indexed as (JSON)
    Chunk {
        /// Document to split (.txt, .pdf or .docx)
        file: PathBuf,
    },
    /// Index a document and answer one question about it
    Ask {
        /// Document to index (.txt, .pdf or .docx)
        file: PathBuf,
        /// Question to answer from the document
        #[arg(long, short)]
        question: String,
    },
    /// Index a document and answer questions read from stdin, one per line
    Chat {
        /// Document to index (.txt, .pdf or .docx)
        file: PathBuf,
    },
    /// Ask general legal questions (no document needed)
    Legal {
        /// Ask a single question instead of starting a conversation
        #[arg(long, short)]
        message: Option<String>,
    },
    /// List the models available on the Ollama server
    Models,
}

#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Ollama server address
    #[arg(long, global = true, env = "OLLAMA_HOST", default_value = DEFAULT_BASE_URL)]
    pub ollama_url: String,

    /// Ollama model used for embeddings
    #[arg(long, global = true, env = "OLLAMA_EMBED_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embed_model: String,

    /// Vector size produced by the embedding model
    #[arg(long, global = true, env = "DOCCHAT_EMBED_DIMENSIONS", default_value_t = 768)]
    pub embed_dimensions: usize,

    /// Ollama model used to generate answers
    #[arg(long, global = true, env = "OLLAMA_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    pub model: String,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Chunk window size in characters
    #[arg(long, global = true, env = "DOCCHAT_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true, env = "DOCCHAT_CHUNK_OVERLAP", default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Number of excerpts retrieved per question
    #[arg(long, short = 'k', global = true, env = "DOCCHAT_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Owner recorded for uploaded documents
    #[arg(long, global = true, env = "DOCCHAT_USER", default_value = "local")]
    pub user: String,
}

impl BackendArgs {
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: normalize_host(&self.ollama_url),
            embedding_model: self.embed_model.clone(),
            dimensions: self.embed_dimensions,
            chat_model: self.model.clone(),
        }
    }
}

impl PipelineArgs {
    /// Validated pipeline configuration.
    pub fn rag_config(&self, model: &str) -> docchat_rag::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .generation_model(model)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_parses_question_and_overrides() {
        let cli = Cli::try_parse_from([
            "docchat", "ask", "lease.pdf", "-q", "When is rent due?", "-k", "5", "--chunk-size", "400",
        ])
        .unwrap();
        assert_eq!(cli.pipeline.top_k, 5);
        assert_eq!(cli.pipeline.chunk_size, 400);
        match cli.command {
            Command::Ask { file, question } => {
                assert_eq!(file, PathBuf::from("lease.pdf"));
                assert_eq!(question, "When is rent due?");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn scheme_less_ollama_url_gets_http() {
        let cli = Cli::try_parse_from(["docchat", "--ollama-url", "127.0.0.1:11434", "models"]).unwrap();
        assert_eq!(cli.backend.ollama_config().base_url, "http://127.0.0.1:11434");
    }

    #[test]
    fn legal_accepts_an_optional_message() {
        let cli = Cli::try_parse_from(["docchat", "legal", "-m", "Is a verbal contract binding?"]).unwrap();
        assert!(matches!(cli.command, Command::Legal { message: Some(ref m) } if m.ends_with('?')));

        let cli = Cli::try_parse_from(["docchat", "legal"]).unwrap();
        assert!(matches!(cli.command, Command::Legal { message: None }));
    }

    #[test]
    fn invalid_overlap_is_reported_by_config() {
        let cli = Cli::try_parse_from([
            "docchat", "--chunk-size", "10", "--chunk-overlap", "10", "models",
        ])
        .unwrap();
        assert!(cli.pipeline.rag_config("llama3.2").is_err());
    }
}
