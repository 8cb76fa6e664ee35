/// Name of the vote share statistic for `column`.
pub(super) fn share_name(column: &str, election: Option<&str>) -> String {
    match election {
        Some(election) => format!("{election}: {column}%"),
        None => format!("{column}%"),
    }
}

/// Fraction of each part's votes (summed over `tallies`) cast for `column`; zero where no votes were cast.
pub(super) fn shares(column: &[f64], tallies: &[&[f64]]) -> Vec<f64> {
    column.iter().enumerate().map(|(part, &votes)| {
        let total = tallies.iter().map(|tally| tally[part]).sum::<f64>();
        if total == 0.0 { 0.0 } else { votes / total }
    }).collect()
}
