//! Statistics Accumulator

use std::collections::BTreeMap;

/// Aggregates end-of-run diagnostics. Statistic names use `/` to separate a
/// category from the title, for example `"Lens/Rays traced"`.
#[derive(Clone, Debug, Default)]
pub struct StatsAccumulator {
    /// Counters.
    counters: BTreeMap<String, u64>,

    /// Memory counters in bytes.
    memory_counters: BTreeMap<String, u64>,

    /// Percentages as (numerator, denominator).
    percentages: BTreeMap<String, (u64, u64)>,
}

impl StatsAccumulator {
    /// Create a new instance of `StatsAccumulator`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates a counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Counter value.
    pub fn report_counter(&mut self, name: &str, val: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates a memory counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Memory counter value.
    pub fn report_memory_counter(&mut self, name: &str, val: u64) {
        *self.memory_counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates a percentage value.
    ///
    /// * `name`  - Statistic name.
    /// * `num`   - Numerator (actual count).
    /// * `denom` - Denominator (total count).
    pub fn report_percentage(&mut self, name: &str, num: u64, denom: u64) {
        let v = self.percentages.entry(name.to_string()).or_insert((0, 0));
        v.0 += num;
        v.1 += denom;
    }

    /// Returns the accumulated value of a counter.
    ///
    /// * `name` - Statistic name.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// Returns the accumulated percentage in [0, 100] or `None` if nothing
    /// was reported under that name or the denominator is 0.
    ///
    /// * `name` - Statistic name.
    pub fn percentage(&self, name: &str) -> Option<f64> {
        self.percentages
            .get(name)
            .filter(|(_, denom)| *denom > 0)
            .map(|&(num, denom)| 100.0 * num as f64 / denom as f64)
    }

    /// Returns the report, one category heading followed by its indented
    /// items.
    pub fn report(&self) -> Vec<String> {
        let mut to_print: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (k, v) in self.counters.iter() {
            let (category, title) = get_category_and_title(k);
            to_print
                .entry(category)
                .or_default()
                .push(format!("{title:-42}               {v:12}"));
        }

        for (k, v) in self.memory_counters.iter() {
            if *v == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(k);
            let kb = *v as f64 / 1024.0;
            let s = if kb < 1024.0 {
                format!("{title:-42}                  {kb:9.2} kB")
            } else {
                format!("{title:-42}                  {:9.2} MiB", kb / 1024.0)
            };
            to_print.entry(category).or_default().push(s);
        }

        for (k, &(num, denom)) in self.percentages.iter() {
            if denom == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(k);
            to_print.entry(category).or_default().push(format!(
                "{title:-42}{num:12} / {denom:12} ({:.2}%)",
                (100.0 * num as f64) / denom as f64,
            ));
        }

        let mut lines = vec![String::from("Statistics:")];
        for (category, items) in to_print {
            lines.push(format!("  {category}"));
            lines.extend(items.into_iter().map(|item| format!("    {item}")));
        }
        lines
    }

    /// Prints the report through the logger.
    pub fn print(&self) {
        for line in self.report() {
            info!("{line}");
        }
    }
}

/// Splits a statistic name at the first `/` as the separator and returns
/// category and title. If there is no `/`, then category is the empty string.
///
/// * `s` - The statistic name to split.
fn get_category_and_title(s: &str) -> (String, String) {
    match s.split_once('/') {
        Some((category, title)) => (category.to_string(), title.to_string()),
        None => (String::new(), s.to_string()),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut stats = StatsAccumulator::new();
        stats.report_counter("Lens/Rays traced", 10);
        stats.report_counter("Lens/Rays traced", 5);
        assert_eq!(stats.counter("Lens/Rays traced"), Some(15));
        assert_eq!(stats.counter("Lens/Unknown"), None);
    }

    #[test]
    fn percentages_accumulate() {
        let mut stats = StatsAccumulator::new();
        stats.report_percentage("Lens/Vignetted rays", 1, 4);
        stats.report_percentage("Lens/Vignetted rays", 1, 4);
        assert_eq!(stats.percentage("Lens/Vignetted rays"), Some(25.0));

        stats.report_percentage("Lens/Empty", 0, 0);
        assert_eq!(stats.percentage("Lens/Empty"), None);
    }

    #[test]
    fn report_groups_by_category() {
        let mut stats = StatsAccumulator::new();
        stats.report_counter("Lens/Rays traced", 8);
        stats.report_memory_counter("Memory/Bokeh distribution", 2048);
        stats.report_percentage("Lens/Vignetted rays", 2, 8);

        let lines = stats.report();
        assert_eq!(lines[0], "Statistics:");
        assert_eq!(lines[1], "  Lens");
        assert!(lines[2].contains("Rays traced"));
        assert!(lines[3].contains("(25.00%)"));
        assert_eq!(lines[4], "  Memory");
        assert!(lines[5].contains("2.00 kB"));

        assert_eq!(StatsAccumulator::new().report().len(), 1);
    }

    #[test]
    fn category_split() {
        assert_eq!(
            get_category_and_title("Lens/Rays/traced"),
            (String::from("Lens"), String::from("Rays/traced"))
        );
        assert_eq!(get_category_and_title("Rays"), (String::new(), String::from("Rays")));
    }
}
