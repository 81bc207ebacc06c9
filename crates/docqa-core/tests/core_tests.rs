use std::fs;
use tempfile::TempDir;

use docqa_core::chunker::Chunker;
use docqa_core::config::{ChunkingConfig, Config, GenerationBackendKind};
use docqa_core::loader::DocumentLoader;
use docqa_core::types::Document;
use docqa_core::Error;

fn doc(id: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        raw_text: text.to_string(),
        source_name: id.rsplit('/').next().unwrap().to_string(),
        source_path: id.to_string(),
    }
}

fn chunker(chunk_size: usize, chunk_overlap: usize) -> Chunker {
    Chunker::new(&ChunkingConfig { chunk_size, chunk_overlap, ..ChunkingConfig::default() }).expect("chunker")
}

fn long_markdown() -> String {
    let mut text = String::from("# Persistence guide\n\nLangGraph ships a persistence layer.\n");
    for section in 0..6 {
        text.push_str(&format!("\n## Section {section}\n"));
        for para in 0..3 {
            for line in 0..4 {
                text.push_str(&format!("Line {line} of paragraph {para} talks about checkpoints and threads.\n"));
            }
            text.push('\n');
        }
    }
    text
}

#[test]
fn short_document_is_a_single_chunk() {
    let c = chunker(1000, 150);
    let chunks = c.split(&doc("notes/a.md", "Short text about graphs."));
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Short text about graphs.");
    assert_eq!(chunks[0].id, "notes/a.md:0");
    assert_eq!(chunks[0].source_name, "a.md");
    assert_eq!(chunks[0].sequence_index, 0);
}

#[test]
fn blank_document_yields_no_chunks() {
    assert!(chunker(100, 10).split(&doc("a.md", "  \n\n \t")).is_empty());
}

#[test]
fn chunking_is_deterministic() {
    let c = chunker(300, 50);
    let d = doc("guide.md", &long_markdown());
    let first = c.split(&d);
    let second = c.split(&d);
    assert!(first.len() > 1);
    assert_eq!(first, second);
    for (i, ch) in first.iter().enumerate() {
        assert_eq!(ch.sequence_index, i);
        assert_eq!(ch.document_id, "guide.md");
    }
}

#[test]
fn chunks_respect_size_limit() {
    for (size, overlap) in [(300, 50), (120, 30), (1000, 150), (80, 0)] {
        let c = chunker(size, overlap);
        for ch in c.split(&doc("guide.md", &long_markdown())) {
            let len = ch.text.chars().count();
            assert!(len <= size, "chunk of {len} chars exceeds {size}: {:?}", ch.text);
        }
    }
}

#[test]
fn adjacent_chunks_share_overlap() {
    let overlap = 50;
    let c = chunker(300, overlap);
    let chunks = c.split(&doc("guide.md", &long_markdown()));
    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        let head: String = pair[1].text.chars().take(overlap).collect();
        assert_eq!(head.chars().count(), overlap);
        assert!(pair[0].text.ends_with(&head), "{:?} does not end with {:?}", pair[0].text, head);
    }
}

#[test]
fn prefers_section_boundaries() {
    let mut text = String::from("# Guide\nIntro text.");
    for i in 0..5 {
        text.push_str(&format!("\n## Section {i}\n{}", "word ".repeat(20)));
    }
    let overlap = 20;
    let chunks = chunker(200, overlap).split(&doc("guide.md", &text));
    assert!(chunks.len() >= 4);
    for ch in chunks.iter().skip(1) {
        let body: String = ch.text.chars().skip(overlap).collect();
        assert!(body.starts_with("\n## Section"), "body does not start at a heading: {body:?}");
    }
}

#[test]
fn atomic_run_may_exceed_limit() {
    let long_token = "x".repeat(300);
    let text = format!("short words here {long_token} tail words");
    let chunks = chunker(100, 10).split(&doc("a.txt", &text));
    let oversized: Vec<_> = chunks.iter().filter(|c| c.text.chars().count() > 100).collect();
    assert_eq!(oversized.len(), 1);
    assert!(oversized[0].text.contains(&long_token));
    assert!(chunks.last().unwrap().text.ends_with("tail words"));
}

#[test]
fn invalid_chunking_config_is_rejected() {
    let bad_overlap = ChunkingConfig { chunk_size: 100, chunk_overlap: 100, ..ChunkingConfig::default() };
    assert!(matches!(Chunker::new(&bad_overlap), Err(Error::InvalidConfig(_))));
    let empty_sep = ChunkingConfig { separators: vec!["\n".into(), String::new()], ..ChunkingConfig::default() };
    assert!(matches!(Chunker::new(&empty_sep), Err(Error::InvalidConfig(_))));
}

#[test]
fn loader_reads_matching_files_and_reports_bad_ones() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("a.md"), "alpha bravo").unwrap();
    fs::write(dir.join("sub/b.txt"), "charlie delta").unwrap();
    fs::write(dir.join("ignored.rs"), "fn main() {}").unwrap();
    fs::write(dir.join("bad.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let loader = DocumentLoader::new(dir, &["md".to_string(), "txt".to_string()]);
    let report = loader.load().expect("load");

    let ids: Vec<_> = report.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a.md", "sub/b.txt"]);
    assert_eq!(report.documents[1].source_name, "b.txt");
    assert_eq!(report.documents[1].source_path, "sub/b.txt");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("bad.md"));
    assert!(matches!(report.failures[0].error, Error::Encoding { .. }));
}

#[test]
fn loader_requires_existing_root() {
    let tmp = TempDir::new().unwrap();
    let loader = DocumentLoader::new(tmp.path().join("missing"), &["md".to_string()]);
    assert!(matches!(loader.load(), Err(Error::NotFound(_))));
}

#[test]
fn config_merges_env_files_and_resolves_paths() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("config.toml"),
        "[corpus]\npath = \"corpus\"\n\n[retrieval]\nk = 5\n\n[generation]\nbackend = \"hosted\"\n",
    )
    .unwrap();
    fs::write(dir.join("config.test.toml"), "[chunking]\nchunk_size = 400\nchunk_overlap = 40\n").unwrap();

    let config = Config::load_for_env(dir, "test").expect("config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.k, 5);
    assert_eq!(settings.chunking.chunk_size, 400);
    assert_eq!(settings.chunking.chunk_overlap, 40);
    assert_eq!(settings.generation.backend, GenerationBackendKind::Hosted);
    assert_eq!(settings.corpus.path, dir.join("corpus"));
    assert_eq!(settings.chunking.separators[0], "\n## ");
    assert_eq!(config.get::<usize>("retrieval.k").unwrap(), 5);
}

#[test]
fn config_rejects_overlap_not_smaller_than_chunk_size() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();
    let config = Config::load_for_env(tmp.path(), "none").expect("config");
    assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));
}

#[test]
fn overlap_shrinks_to_keep_mid_sized_words_within_limit() {
    // every word is longer than chunk_size - overlap but fits in chunk_size
    let chunks = chunker(10, 5).split(&doc("a.txt", "abcdefgh ijklmnop qrstuvwx"));
    let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["abcdefgh", "h ijklmnop", "p qrstuvwx"]);
    for pair in chunks.windows(2) {
        let head: String = pair[1].text.chars().take(1).collect();
        assert!(pair[0].text.ends_with(&head));
    }
}

#[test]
fn long_token_under_default_limits_stays_within_chunk_size() {
    let text = format!("{}{} tail words", "word ".repeat(120), "y".repeat(900));
    let chunks = chunker(1000, 150).split(&doc("a.txt", &text));
    assert_eq!(chunks.len(), 3);
    for ch in &chunks {
        assert!(ch.text.chars().count() <= 1000, "chunk of {} chars", ch.text.chars().count());
    }
    assert!(chunks[1].text.contains(&"y".repeat(900)));
    assert!(chunks[2].text.starts_with(&"y".repeat(150)));
}
