//! Tower-lsp backend for the vaisto language server.
//!
//! Advertises the capabilities the elaborator can actually back:
//! full-document sync, hover (inferred scheme of a top-level name),
//! go-to-definition and document symbols for top-level declarations, and
//! diagnostics on open/change/save.

use std::collections::HashMap;
use std::sync::Mutex;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use vaisto_syntax::ast::Item;

use crate::analysis::{self, AnalysisResult};
use crate::definition;

struct DocumentState {
    source: String,
    analysis: AnalysisResult,
}

pub struct VaistoBackend {
    client: Client,
    documents: Mutex<HashMap<String, DocumentState>>,
}

impl VaistoBackend {
    pub fn new(client: Client) -> Self {
        Self { client, documents: Mutex::new(HashMap::new()) }
    }

    async fn analyze_and_publish(&self, uri: Url, source: String) {
        let uri_str = uri.to_string();
        let module_name = module_name_from_uri(&uri_str);
        let result = analysis::analyze_document(&module_name, &source);
        let diagnostics = result.diagnostics.clone();

        {
            let mut docs = self.documents.lock().unwrap();
            docs.insert(uri_str, DocumentState { source, analysis: result });
        }

        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

/// Derive a module name from a document URI for elaboration purposes. The
/// server doesn't resolve cross-file imports, so the exact name only
/// matters for diagnostics that mention it.
fn module_name_from_uri(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or("Main").trim_end_matches(".va").to_string()
}

#[tower_lsp::async_trait]
impl LanguageServer for VaistoBackend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client.log_message(MessageType::INFO, "vaisto language server initialized").await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.analyze_and_publish(params.text_document.uri, params.text_document.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().next() {
            self.analyze_and_publish(params.text_document.uri, change.text).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(text) = params.text {
            self.analyze_and_publish(params.text_document.uri, text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri_str = params.text_document.uri.to_string();
        self.documents.lock().unwrap().remove(&uri_str);
        self.client.publish_diagnostics(params.text_document.uri, vec![], None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri_str = params.text_document_position_params.text_document.uri.to_string();
        let position = params.text_document_position_params.position;

        let docs = self.documents.lock().unwrap();
        let doc = match docs.get(&uri_str) {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let offset = match analysis::position_to_offset(&doc.source, &position) {
            Some(o) => o,
            None => return Ok(None),
        };
        let word = match analysis::word_at_offset(&doc.source, offset) {
            Some(w) => w,
            None => return Ok(None),
        };

        let iface = match &doc.analysis.typeck.interface {
            Some(i) => i,
            None => return Ok(None),
        };

        let text = if let Some(scheme) = iface.functions.get(&word) {
            format!("{}: {}", word, scheme.ty)
        } else if let Some(proc) = iface.processes.get(&word) {
            format!("process {} : {} [{}]", word, proc.state_ty, proc.tags.join(", "))
        } else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value: format!("```vaisto\n{text}\n```") }),
            range: None,
        }))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri.clone();
        let uri_str = uri.to_string();
        let position = params.text_document_position_params.position;

        let docs = self.documents.lock().unwrap();
        let doc = match docs.get(&uri_str) {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let offset = match analysis::position_to_offset(&doc.source, &position) {
            Some(o) => o,
            None => return Ok(None),
        };
        let word = match analysis::word_at_offset(&doc.source, offset) {
            Some(w) => w,
            None => return Ok(None),
        };

        let loc = match definition::find_definition(&doc.analysis.module, &word) {
            Some(l) => l,
            None => return Ok(None),
        };

        let start = analysis::offset_to_position(&doc.source, loc.start);
        let end = analysis::offset_to_position(&doc.source, loc.end);
        Ok(Some(GotoDefinitionResponse::Scalar(Location { uri, range: Range::new(start, end) })))
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let uri_str = params.text_document.uri.to_string();
        let docs = self.documents.lock().unwrap();
        let doc = match docs.get(&uri_str) {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let symbols = collect_symbols(&doc.source, &doc.analysis.module);
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }
}

#[allow(deprecated)]
fn collect_symbols(source: &str, module: &vaisto_syntax::ast::Module) -> Vec<SymbolInformation> {
    let uri = Url::parse("file:///unused").unwrap();
    module
        .items
        .iter()
        .filter_map(|item| {
            let (name, kind, loc) = match item {
                Item::Fn(def) => (def.name.clone(), SymbolKind::FUNCTION, def.loc),
                Item::SumType(def) => (def.name.clone(), SymbolKind::ENUM, def.loc),
                Item::Record(def) => (def.name.clone(), SymbolKind::STRUCT, def.loc),
                Item::Class(def) => (def.name.clone(), SymbolKind::INTERFACE, def.loc),
                Item::Instance(def) => (format!("instance {} {}", def.class, def.head.name), SymbolKind::OBJECT, def.loc),
                Item::Process(def) => (def.name.clone(), SymbolKind::CLASS, def.loc),
            };
            let start = analysis::offset_to_position(source, loc.start);
            let end = analysis::offset_to_position(source, loc.end);
            Some(SymbolInformation {
                name,
                kind,
                tags: None,
                deprecated: None,
                location: Location { uri: uri.clone(), range: Range::new(start, end) },
                container_name: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_capabilities() {
        let (service, _) = tower_lsp::LspService::new(VaistoBackend::new);
        let server = service.inner();
        let result = server.initialize(InitializeParams::default()).await.unwrap();

        let caps = result.capabilities;
        assert!(caps.hover_provider.is_some());
        assert!(caps.text_document_sync.is_some());
        assert!(caps.document_symbol_provider.is_some());
        assert!(caps.definition_provider.is_some());
    }
}
