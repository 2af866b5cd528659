use anyhow::Result;
use pdfscan::analysis::{analyze, score, KeywordSet};
use pdfscan::config::{ExtractorAccess, RankingMode};
use pdfscan::extract::PdfTextExtractor;
use pdfscan::pipeline::WorkerPool;
use pdfscan::{
    Document, Engine, ErrorKind, ExtractionFailure, ScanConfig, ScanError, TextExtractor,
};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

/// A one-page PDF showing `text` in Helvetica, with a correct xref table
fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    pdf
}

/// Serves text keyed by file name without touching the disk
struct ScriptedExtractor {
    texts: HashMap<String, String>,
}

impl ScriptedExtractor {
    fn new(texts: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            texts: texts
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
        })
    }
}

impl TextExtractor for ScriptedExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| ExtractionFailure::corrupted(path, "no scripted text"))
    }
}

fn touch_all(dir: &TempDir, names: &[&str]) -> Result<()> {
    for name in names {
        fs::write(dir.path().join(name), b"%PDF-1.4 placeholder")?;
    }
    Ok(())
}

#[test]
fn test_real_pdf_extraction() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.pdf");
    fs::write(&path, minimal_pdf("The quarterly report is attached"))?;

    let text = PdfTextExtractor::default().extract(&path)?;
    assert!(text.to_lowercase().contains("quarterly"));
    Ok(())
}

#[test]
fn test_one_corrupted_pdf_among_five() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..4 {
        fs::write(
            dir.path().join(format!("doc{}.pdf", i)),
            minimal_pdf(&format!("budget memo number {}", i)),
        )?;
    }
    fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\ngarbage without objects")?;

    let paths: Vec<PathBuf> = fs::read_dir(dir.path())?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(paths.len(), 5);

    let pool = WorkerPool::new(Arc::new(PdfTextExtractor::default()), KeywordSet::new(["budget"]))
        .with_workers(NonZeroUsize::new(3).unwrap());
    let (documents, failures): (Vec<_>, Vec<_>) = pool.run(paths)?.partition(|o| o.is_ok());

    assert_eq!(documents.len(), 4);
    assert_eq!(failures.len(), 1);
    let failure = failures.into_iter().next().unwrap().unwrap_err();
    assert_eq!(failure.cause, ErrorKind::UnsupportedOrCorrupted);
    assert!(failure.path.ends_with("broken.pdf"));
    Ok(())
}

#[test]
fn test_search_scenario_through_engine() -> Result<()> {
    let dir = tempdir()?;
    touch_all(&dir, &["a.pdf", "b.pdf", "c.pdf"])?;
    let extractor = ScriptedExtractor::new(&[
        ("a.pdf", "monthly report"),
        ("b.pdf", "Quarterly report one.\nQuarterly\nreport two."),
        ("c.pdf", "quarterly reports are late"),
    ]);

    let engine = Engine::new(ScanConfig::default())?.with_extractor(extractor);
    let report = engine.search("quarterly report", &[dir.path().to_path_buf()], false)?;

    // "quarterly reports" contains the phrase as a substring
    let counts: HashMap<String, usize> = report
        .matches
        .iter()
        .map(|m| (m.path.file_name().unwrap().to_string_lossy().to_string(), m.occurrence_count))
        .collect();
    assert_eq!(counts.get("b.pdf"), Some(&2));
    assert_eq!(counts.get("c.pdf"), Some(&1));
    assert!(!counts.contains_key("a.pdf"));
    assert_eq!(report.summary.succeeded, 3);
    Ok(())
}

#[test]
fn test_search_is_repeatable() -> Result<()> {
    let dir = tempdir()?;
    let names: Vec<String> = (0..20).map(|i| format!("f{:02}.pdf", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    touch_all(&dir, &refs)?;

    let texts: Vec<(String, String)> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), "needle ".repeat(i % 4)))
        .collect();
    let text_refs: Vec<(&str, &str)> = texts.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    let engine = Engine::new(ScanConfig::default())?.with_extractor(ScriptedExtractor::new(&text_refs));

    let collect = |engine: &Engine| -> Result<Vec<(PathBuf, usize)>> {
        let mut found: Vec<_> = engine
            .search("needle", &[dir.path().to_path_buf()], false)?
            .matches
            .into_iter()
            .map(|m| (m.path, m.occurrence_count))
            .collect();
        found.sort();
        Ok(found)
    };

    let first = collect(&engine)?;
    let second = collect(&engine)?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 15);
    Ok(())
}

#[test]
fn test_analysis_scenario() -> Result<()> {
    let keywords = KeywordSet::new(["alpha", "beta"]);
    let make = |path: &str, text: &str| {
        let scored = score(text, &keywords);
        Document {
            path: PathBuf::from(path),
            text: text.to_string(),
            token_count: scored.token_count,
            keyword_counts: scored.keyword_counts,
        }
    };
    let documents = vec![
        make("D1", "alpha alpha alpha beta beta"),
        make("D2", "beta beta beta beta beta"),
    ];

    let report = analyze(&documents, &keywords, 0.0, RankingMode::CorrelationBoosted)?;
    let r = report.matrix.coefficient("alpha", "beta").unwrap();
    assert!((-1.0..=1.0).contains(&r));
    assert_eq!(report.matrix.coefficient("beta", "alpha"), Some(r));
    assert_eq!(report.significant_pairs.len(), 1);

    let order: Vec<_> = report.ranking.iter().map(|d| d.path.clone()).collect();
    assert_eq!(order, vec![PathBuf::from("D1"), PathBuf::from("D2")]);
    Ok(())
}

#[test]
fn test_engine_analysis_with_serialized_extractor() -> Result<()> {
    let dir = tempdir()?;
    touch_all(&dir, &["x.pdf", "y.pdf", "z.pdf"])?;
    let extractor = ScriptedExtractor::new(&[
        ("x.pdf", "risk and inflation, inflation risk"),
        ("y.pdf", "inflation only"),
        ("z.pdf", "nothing relevant"),
    ]);
    let config = ScanConfig {
        extractor_access: ExtractorAccess::Serialized,
        ..Default::default()
    };

    let report = Engine::new(config)?
        .with_extractor(extractor)
        .analyze(
            &[dir.path().to_path_buf()],
            &["risk".to_string(), "Inflation".to_string(), "risk".to_string()],
        )?;

    assert_eq!(report.keywords, vec!["risk", "Inflation"]);
    assert_eq!(report.documents_analyzed, 3);
    assert_eq!(report.ranking[0].path, dir.path().join("x.pdf"));
    assert_eq!(report.ranking[2].score, 0.0);
    Ok(())
}

#[test]
fn test_nothing_to_process_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("notes.txt"), "text")?;
    let engine = Engine::new(ScanConfig::default())?;

    let err = engine
        .search("anything", &[dir.path().to_path_buf()], false)
        .unwrap_err();
    assert!(matches!(err, ScanError::NoInputFiles));
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    Ok(())
}
