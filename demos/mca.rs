use std::error::Error;

use linfa::{traits::Fit, DatasetBase};
use linfa_mca::{CategoricalTable, Mca};
use ndarray::Array2;
use rand::{rngs::SmallRng, Rng, SeedableRng};

// Analyse a synthetic survey: every respondent belongs to one of three hidden groups, which
// shapes their answers to four questions. MCA should recover the groups on the first two axes.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Our random number generator, seeded for reproducibility
    let mut rng = SmallRng::seed_from_u64(42);

    let answers = [
        ["never", "rarely", "often"],
        ["city", "suburb", "village"],
        ["bus", "bike", "car"],
        ["young", "middle", "old"],
    ];
    let n = 60;
    let groups = (0..n).map(|_| rng.gen_range(0..3)).collect::<Vec<usize>>();
    let values = Array2::from_shape_fn((n, answers.len()), |(i, j)| {
        let level = if rng.gen_bool(0.75) {
            groups[i]
        } else {
            rng.gen_range(0..3)
        };
        answers[j][level].to_string()
    });

    let table = CategoricalTable::new(
        vec![
            "restaurant".into(),
            "residence".into(),
            "commute".into(),
            "age".into(),
        ],
        values,
    )?;
    let dataset = DatasetBase::new(table, ());

    let mut mca = Mca::<f64>::params().fit(&dataset)?;

    println!("singular values: {:.4}", mca.singular_values());
    println!("rank {} with total inertia {:.4}", mca.rank(), mca.inertia());
    println!("explained variance: {:.4}", mca.expl_var(false, None)?);
    println!("Greenacre explained variance: {:.4}", mca.expl_var(true, None)?);

    let columns = mca.column_factor_scores(0.9, Some(2))?;
    if let Some(coding) = mca.coding() {
        for (name, scores) in coding.column_names().iter().zip(columns.rows()) {
            println!("{:>20}: {:.4}", name, scores);
        }
    }

    let rows = mca.row_factor_scores(0.9, Some(2))?;
    for (group, scores) in groups.iter().zip(rows.rows()).take(10) {
        println!("group {}: {:.4}", group, scores);
    }

    println!("contributions of the levels:\n{:.4}", mca.cont_c(Some(2))?);

    Ok(())
}
