use lopdf::{dictionary, Document, Object};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn gitpdf_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gitpdf"));
    cmd.env_remove("GITPDF_KEY")
        .env_remove("GITPDF_KEY_FILE")
        .env_remove("GITPDF_LOG");
    cmd
}

fn run(args: &[&str]) -> Result<Output, Box<dyn Error>> {
    Ok(gitpdf_command().args(args).output()?)
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> Result<String, Box<dyn Error>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .output()?;
    if !output.status.success() {
        return Err(format!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        )
        .into());
    }
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Initialise a repository with two commits and return the head commit id
fn make_repo(dir: &Path) -> Result<String, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    git(dir, &["init", "--quiet"])?;
    fs::write(dir.join("README.md"), "# demo\n")?;
    git(dir, &["add", "README.md"])?;
    git(dir, &["commit", "--quiet", "-m", "initial"])?;
    fs::write(dir.join("notes.txt"), "second commit\n")?;
    git(dir, &["add", "notes.txt"])?;
    git(dir, &["commit", "--quiet", "-m", "second"])?;
    git(dir, &["rev-parse", "HEAD"])
}

fn plain_pdf(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

fn keygen(path: &Path) -> Result<(), Box<dyn Error>> {
    let out = run(&["keygen", "--output", path.to_str().unwrap()])?;
    assert!(
        out.status.success(),
        "keygen failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn cli_version_and_help() -> Result<(), Box<dyn Error>> {
    let version = run(&["--version"])?;
    assert!(version.status.success());
    assert!(String::from_utf8(version.stdout)?.starts_with("gitpdf "));

    let help = run(&[])?;
    assert!(help.status.success());
    let help_text = String::from_utf8(help.stdout)?;
    for command in ["embed", "extract", "info", "keygen"] {
        assert!(help_text.contains(command), "help should list {}", command);
    }
    Ok(())
}

#[test]
fn cli_cipher_help_names_legacy_layout() -> Result<(), Box<dyn Error>> {
    for command in ["embed", "extract"] {
        let help = run(&[command, "--help"])?;
        assert!(help.status.success());
        let text = String::from_utf8(help.stdout)?;
        assert!(text.contains("--cipher"));
        assert!(text.contains("cfb"), "{} help should mention cfb", command);
    }
    Ok(())
}

#[test]
fn cli_keygen_refuses_overwrite() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let key = dir.path().join("gitpdf.key");

    let first = run(&["keygen", "--output", key.to_str().unwrap()])?;
    assert!(first.status.success());
    assert!(String::from_utf8(first.stdout)?.contains("Wrote key"));
    let contents = fs::read_to_string(&key)?;
    assert_eq!(contents.trim().len(), 64);

    let second = run(&["keygen", "--output", key.to_str().unwrap()])?;
    assert!(!second.status.success());
    assert_eq!(fs::read_to_string(&key)?, contents);
    Ok(())
}

#[test]
fn cli_missing_key_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let output = dir.path().join("out.pdf");

    let out = run(&[
        "embed",
        "--repo",
        dir.path().to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])?;
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.starts_with("Error: "), "unexpected stderr: {}", stderr);
    assert!(stderr.contains("GITPDF_KEY"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn cli_extract_without_attachment() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let key = dir.path().join("k");
    let pdf = dir.path().join("plain.pdf");
    let dest = dir.path().join("restored");
    keygen(&key)?;
    plain_pdf(&pdf)?;

    let out = run(&[
        "extract",
        "--key-file",
        key.to_str().unwrap(),
        "--input",
        pdf.to_str().unwrap(),
        "--output",
        dest.to_str().unwrap(),
    ])?;
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr)?;
    assert_eq!(stderr.lines().count(), 1, "expected one error line: {}", stderr);
    assert!(stderr.contains("No attachment found"));
    assert!(!dest.exists());
    Ok(())
}

#[test]
fn cli_embed_missing_repo_leaves_no_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let key = dir.path().join("k");
    let output = dir.path().join("out.pdf");
    keygen(&key)?;

    let out = run(&[
        "embed",
        "--key-file",
        key.to_str().unwrap(),
        "--repo",
        dir.path().join("absent").to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])?;
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr)?.contains("create-archive failed"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn cli_round_trip() -> Result<(), Box<dyn Error>> {
    if !git_available() {
        eprintln!("git not available, skipping");
        return Ok(());
    }

    let dir = tempdir()?;
    let repo = dir.path().join("source");
    let key = dir.path().join("k");
    let pdf = dir.path().join("report.pdf");
    let restored = dir.path().join("restored");
    let head = make_repo(&repo)?;
    keygen(&key)?;

    let embed = run(&[
        "embed",
        "--key-file",
        key.to_str().unwrap(),
        "--repo",
        repo.to_str().unwrap(),
        "--output",
        pdf.to_str().unwrap(),
    ])?;
    assert!(
        embed.status.success(),
        "embed failed: {}",
        String::from_utf8_lossy(&embed.stderr)
    );
    assert!(String::from_utf8(embed.stdout)?.contains("Embedded"));
    assert!(fs::read(&pdf)?.starts_with(b"%PDF-"));

    let info = run(&["info", pdf.to_str().unwrap()])?;
    let info_text = String::from_utf8(info.stdout)?;
    assert!(info_text.contains("report.csv"));
    assert!(info_text.contains("Monthly Report"));

    // Embedding again must not clobber without --force
    let again = run(&[
        "embed",
        "--key-file",
        key.to_str().unwrap(),
        "--repo",
        repo.to_str().unwrap(),
        "--output",
        pdf.to_str().unwrap(),
    ])?;
    assert!(!again.status.success());

    let extract = run(&[
        "extract",
        "--key-file",
        key.to_str().unwrap(),
        "--input",
        pdf.to_str().unwrap(),
        "--output",
        restored.to_str().unwrap(),
    ])?;
    assert!(
        extract.status.success(),
        "extract failed: {}",
        String::from_utf8_lossy(&extract.stderr)
    );

    assert_eq!(git(&restored, &["rev-parse", "HEAD"])?, head);
    assert_eq!(fs::read_to_string(restored.join("notes.txt"))?, "second commit\n");
    assert_eq!(git(&restored, &["rev-list", "--count", "HEAD"])?, "2");

    // A second extract into the now populated directory is refused
    let refused = run(&[
        "extract",
        "--key-file",
        key.to_str().unwrap(),
        "--input",
        pdf.to_str().unwrap(),
        "--output",
        restored.to_str().unwrap(),
    ])?;
    assert!(!refused.status.success());
    Ok(())
}

#[test]
fn cli_legacy_cfb_round_trip_with_env_key() -> Result<(), Box<dyn Error>> {
    if !git_available() {
        eprintln!("git not available, skipping");
        return Ok(());
    }

    let dir = tempdir()?;
    let repo = dir.path().join("source");
    let pdf = dir.path().join("legacy.pdf");
    let restored = dir.path().join("restored");
    let head = make_repo(&repo)?;
    let key_hex = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    let embed = gitpdf_command()
        .env("GITPDF_KEY", key_hex)
        .args([
            "embed",
            "--cipher",
            "cfb",
            "--attachment-name",
            "data.bin",
            "--repo",
            repo.to_str().unwrap(),
            "--output",
            pdf.to_str().unwrap(),
        ])
        .output()?;
    assert!(
        embed.status.success(),
        "embed failed: {}",
        String::from_utf8_lossy(&embed.stderr)
    );

    let info = run(&["info", "--json", pdf.to_str().unwrap()])?;
    let json: serde_json::Value = serde_json::from_slice(&info.stdout)?;
    assert_eq!(json["attachments"][0]["filename"], "data.bin");

    let extract = gitpdf_command()
        .env("GITPDF_KEY", key_hex)
        .args([
            "extract",
            "--cipher",
            "cfb",
            "--input",
            pdf.to_str().unwrap(),
            "--output",
            restored.to_str().unwrap(),
        ])
        .output()?;
    assert!(
        extract.status.success(),
        "extract failed: {}",
        String::from_utf8_lossy(&extract.stderr)
    );
    assert_eq!(git(&restored, &["rev-parse", "HEAD"])?, head);
    Ok(())
}
