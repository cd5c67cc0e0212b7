use anyhow::Result;
use record_cleaner::split::{split_file, SplitConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_split_writes_header_into_every_file() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("big.csv");
    fs::write(&source, "id,note\n1,a\n2,\"b, with comma\"\n3,\"multi\nline\"\n4,d\n5,e\n")?;
    let out = dir.path().join("parts");

    let result = split_file(&source, &out, &SplitConfig::default().rows_per_file(2))?;

    assert_eq!(result.total_rows, 5);
    assert_eq!(result.rows_per_file, vec![2, 2, 1]);
    assert_eq!(
        result.paths,
        vec![out.join("chunk_0.csv"), out.join("chunk_1.csv"), out.join("chunk_2.csv")]
    );
    assert_eq!(fs::read_to_string(&result.paths[0])?, "id,note\n1,a\n2,\"b, with comma\"\n");
    assert_eq!(fs::read_to_string(&result.paths[1])?, "id,note\n3,\"multi\nline\"\n4,d\n");
    assert_eq!(fs::read_to_string(&result.paths[2])?, "id,note\n5,e\n");
    Ok(())
}

#[test]
fn test_split_keeps_source_delimiter() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("users.csv");
    fs::write(&source, "id;mail_address\n1;a@b.com\n2;c@d.com\n")?;

    let config = SplitConfig::default().rows_per_file(10).delimiter(b';');
    let result = split_file(&source, dir.path(), &config)?;

    assert_eq!(result.paths.len(), 1);
    assert_eq!(
        fs::read_to_string(&result.paths[0])?,
        "id;mail_address\n1;a@b.com\n2;c@d.com\n"
    );
    Ok(())
}
