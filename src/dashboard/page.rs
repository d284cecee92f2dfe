// src/dashboard/page.rs

use std::path::Path;

use crate::analyze::SummaryId;
use crate::pipeline::read_report;
use crate::visualize::chart_file_name;

/// Static text shown with each chart.
pub struct Caption {
    pub id: SummaryId,
    pub heading: &'static str,
    pub description: &'static str,
}

pub const CAPTIONS: [Caption; 7] = [
    Caption {
        id: SummaryId::TopPollutedCities,
        heading: "Top Polluted Cities",
        description: "Cities ranked by their mean pollutant reading across all pollutants.",
    },
    Caption {
        id: SummaryId::HottestCountries,
        heading: "Hottest Countries",
        description: "Countries ranked by mean recorded land temperature.",
    },
    Caption {
        id: SummaryId::GlobalTemperatureTrend,
        heading: "Global Temperature Trend",
        description: "Mean temperature of every observation in each year.",
    },
    Caption {
        id: SummaryId::CountryTemperatureTrends,
        heading: "Temperature Trends by Country",
        description: "Yearly mean temperature of the countries with the longest records.",
    },
    Caption {
        id: SummaryId::CityTemperatureTrends,
        heading: "Temperature Trends by City",
        description: "Yearly mean temperature of the cities with the longest records.",
    },
    Caption {
        id: SummaryId::PollutantDistribution,
        heading: "Pollutant Distribution",
        description: "Number of observations recorded for each pollutant.",
    },
    Caption {
        id: SummaryId::TemperatureVsAqi,
        heading: "Temperature vs Air Quality",
        description: "Yearly mean temperature against yearly mean pollutant value, per city and year.",
    },
];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn slot(caption: &Caption, visuals_dir: &Path) -> String {
    let image = chart_file_name(caption.id);
    let table = format!("{}.csv", caption.id.as_str());
    let heading = escape_html(caption.heading);

    let figure = if visuals_dir.join(&image).is_file() {
        format!(
            r#"<img src="/visuals/{src}" alt="{alt}">"#,
            src = escape_html(&image),
            alt = heading
        )
    } else {
        r#"<div class="missing">Chart not generated yet. Run the pipeline to create it.</div>"#
            .to_string()
    };
    let data_link = if visuals_dir.join(&table).is_file() {
        format!(
            r#"<p class="data"><a href="/visuals/{0}">{0}</a></p>"#,
            escape_html(&table)
        )
    } else {
        String::new()
    };

    format!(
        r#"<section class="card" id="{id}">
  <h2>{heading}</h2>
  <p>{description}</p>
  {figure}
  {data_link}
</section>"#,
        id = caption.id.as_str(),
        description = escape_html(caption.description),
    )
}

/// The dashboard page. Reads the directory at call time; a missing chart
/// gets a placeholder in its slot and never fails the page.
pub fn render_page(visuals_dir: &Path) -> String {
    let updated = read_report(visuals_dir)
        .map(|r| {
            format!(
                r#"<p class="updated">Last run finished {}</p>"#,
                r.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        })
        .unwrap_or_default();
    let slots: Vec<String> = CAPTIONS.iter().map(|c| slot(c, visuals_dir)).collect();

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Air Quality &amp; Temperature Dashboard</title>
<style>
body {{ font-family: sans-serif; margin: 2em; background: #f5f5f5; }}
.card {{ background: white; border-radius: 8px; padding: 1.5em; margin: 1em 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
.card img {{ max-width: 100%; }}
.missing {{ padding: 3em; text-align: center; color: #888; border: 2px dashed #ccc; }}
.updated {{ color: #555; }}
</style></head><body>
<h1>Air Quality &amp; Temperature Dashboard</h1>
{updated}
{slots}
</body></html>"#,
        slots = slots.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    #[test]
    fn every_chart_has_one_caption() {
        for id in SummaryId::ALL {
            assert_eq!(CAPTIONS.iter().filter(|c| c.id == id).count(), 1, "{:?}", id);
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn empty_dir_renders_placeholders() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let html = render_page(dir.path());
        for c in &CAPTIONS {
            assert!(html.contains(c.heading));
        }
        assert_eq!(html.matches("not generated yet").count(), CAPTIONS.len());
        assert!(!html.contains("Last run finished"));
        Ok(())
    }

    #[test]
    fn present_chart_is_embedded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("hottest_countries.svg"), "<svg/>")?;
        fs::write(dir.path().join("hottest_countries.csv"), "country,mean,count\n")?;
        let html = render_page(dir.path());
        assert!(html.contains(r#"<img src="/visuals/hottest_countries.svg""#));
        assert!(html.contains(r#"href="/visuals/hottest_countries.csv""#));
        assert_eq!(html.matches("not generated yet").count(), CAPTIONS.len() - 1);
        Ok(())
    }
}
