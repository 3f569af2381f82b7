use probing_pt_rs::{load, CountPolicy, TableBuilder, TargetPhrase};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building table...");
    let mut builder = TableBuilder::new(2);
    builder.add_phrase(
        "das haus",
        &TargetPhrase::new(vec![1, 2], vec![-0.4, -1.2]).with_properties("{{Counts 12 8 4}}"),
    )?;
    builder.add_phrase(
        "das haus",
        &TargetPhrase::new(vec![1, 3], vec![-1.1, -2.0]).with_properties("{{Counts 20 8 3}}"),
    )?;
    builder.add_phrase("haus", &TargetPhrase::new(vec![2], vec![-0.2, -0.3]))?;
    let image = builder.finish()?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("phrase-table.prpt");
    image.write_to(&path)?;
    println!("Wrote {} bytes to {}", image.len(), path.display());

    let view = load(&path, image.len() as u64)?;
    for source in ["das haus", "haus", "garten"] {
        match view.lookup_phrase(source) {
            Some(entry) => {
                println!("{:?}: {} target phrase(s)", source, entry.target_index());
                for record in view.target_phrases(&entry)? {
                    let record = record?;
                    let counts = record.counts(CountPolicy::Strict)?;
                    println!(
                        "  words={:?} scores={:?} p(e|f)={:?}",
                        record.words().collect::<Vec<_>>(),
                        record.scores().collect::<Vec<_>>(),
                        counts.map(|c| c.target_given_source())
                    );
                }
            }
            None => println!("{:?}: not found", source),
        }
    }

    println!("Done!");
    Ok(())
}
