//! CSV export of the visible invoice rows.

use chrono::NaiveDate;

/// One CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    /// Written in double quotes, embedded quotes doubled.
    Text(String),
    /// Written bare.
    Number(f64),
    /// Written as nothing.
    Empty,
}

impl CsvValue {
    fn write(&self, out: &mut String) {
        match self {
            Self::Text(s) => {
                out.push('"');
                out.push_str(&s.replace('"', "\"\""));
                out.push('"');
            }
            Self::Number(n) => out.push_str(&n.to_string()),
            Self::Empty => {}
        }
    }
}

/// Header line followed by one line per row, joined with `\n`.
///
/// Headers are written as-is.
pub fn to_csv<I>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<CsvValue>>,
{
    let mut out = headers.join(",");
    for row in rows {
        out.push('\n');
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            cell.write(&mut out);
        }
    }
    out
}

/// `invoices-YYYY-MM-DD.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("invoices-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_rules() {
        let csv = to_csv(
            &["Name", "Score", "Actions"],
            vec![
                vec![
                    CsvValue::Text("Al Futtaim, Group".into()),
                    CsvValue::Number(98.0),
                    CsvValue::Empty,
                ],
                vec![
                    CsvValue::Text("say \"hi\"".into()),
                    CsvValue::Number(4.5),
                    CsvValue::Empty,
                ],
            ],
        );
        assert_eq!(
            csv,
            "Name,Score,Actions\n\"Al Futtaim, Group\",98,\n\"say \"\"hi\"\"\",4.5,"
        );
    }

    #[test]
    fn header_only_when_no_rows() {
        assert_eq!(to_csv(&["A", "B"], Vec::new()), "A,B");
    }

    #[test]
    fn filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap_or_default();
        assert_eq!(export_filename(date), "invoices-2024-09-05.csv");
    }
}
