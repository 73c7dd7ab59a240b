use crate::histogram::{HistogramLayout, MultiHistogramLayout};
use crate::output::{HistogramReport, OutputFormatter, Report, Resolution};
use crate::sankey::SankeyLayout;
use std::io::Write;

/// Human-readable report: a heading, a summary and one table per layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownOutput;

impl MarkdownOutput {
    pub fn new() -> Self {
        Self
    }

    fn sankey<W: Write>(&self, layout: &SankeyLayout, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# Sankey Layout\n")?;
        writeln!(
            writer,
            "{} nodes, {} links in a {}×{} container\n",
            layout.nodes.len(),
            layout.links.len(),
            layout.width,
            layout.height
        )?;
        if layout.is_empty() {
            writeln!(writer, "Nothing to draw.")?;
            return Ok(());
        }

        writeln!(writer, "## Nodes\n")?;
        writeln!(writer, "| # | id | stage | layer | value | x | y |")?;
        writeln!(writer, "|---|----|-------|-------|-------|---|---|")?;
        for n in &layout.nodes {
            writeln!(
                writer,
                "| {} | `{}` | {} | {} | {} | {:.1}–{:.1} | {:.1}–{:.1} |",
                n.index, n.id, n.stage, n.layer, n.value, n.x0, n.x1, n.y0, n.y1
            )?;
        }

        writeln!(writer, "\n## Links\n")?;
        writeln!(writer, "| source | target | value | width |")?;
        writeln!(writer, "|--------|--------|-------|-------|")?;
        for l in &layout.links {
            writeln!(
                writer,
                "| `{}` | `{}` | {} | {:.1} |",
                l.source_id, l.target_id, l.value, l.width
            )?;
        }
        Ok(())
    }

    fn bins<W: Write>(&self, layout: &HistogramLayout, writer: &mut W) -> std::io::Result<()> {
        let [lo, hi] = layout.x_scale.domain();
        let [_, y_max] = layout.y_scale.domain();
        writeln!(
            writer,
            "x domain {}–{}, y domain 0–{}, chart {:.0}×{:.0}\n",
            lo, hi, y_max, layout.chart_width, layout.chart_height
        )?;
        writeln!(writer, "| range | count | density | x | width | height |")?;
        writeln!(writer, "|-------|-------|---------|---|-------|--------|")?;
        for b in &layout.bins {
            writeln!(
                writer,
                "| {}–{} | {} | {:.3} | {:.1} | {:.1} | {:.1} |",
                b.x0, b.x1, b.count, b.density, b.x, b.width, b.height
            )?;
        }
        Ok(())
    }

    fn histogram<W: Write>(&self, report: &HistogramReport, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# Histogram: {}\n", report.layout.metric)?;
        self.bins(&report.layout, writer)?;
        if let Some(line) = report.threshold_line {
            writeln!(
                writer,
                "\nThreshold {} at x = {:.1} (y {:.0}–{:.0})",
                line.value, line.x, line.y1, line.y2
            )?;
        }
        Ok(())
    }

    fn histograms<W: Write>(&self, multi: &MultiHistogramLayout, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# Histograms\n")?;
        writeln!(
            writer,
            "{} charts, total height {}{}\n",
            multi.charts.len(),
            multi.total_height,
            if multi.overflows() {
                format!(" (overflows requested {})", multi.requested_height)
            } else {
                String::new()
            }
        )?;
        for chart in &multi.charts {
            writeln!(
                writer,
                "## {} (title y = {}, chart y = {})\n",
                chart.layout.metric, chart.title_y, chart.y_offset
            )?;
            self.bins(&chart.layout, writer)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    fn resolution<W: Write>(&self, resolution: &Resolution, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# Thresholds at `{}`\n", resolution.node_id)?;
        match resolution.kind {
            Some(kind) => writeln!(writer, "Node kind: {:?}\n", kind)?,
            None => writeln!(writer, "Node kind: unclassified\n")?,
        }
        writeln!(writer, "| metric | value | group | affected |")?;
        writeln!(writer, "|--------|-------|-------|----------|")?;
        for (metric, value) in &resolution.thresholds {
            let group = resolution.groups.iter().find(|g| g.metric == *metric);
            let (group_id, affected) = match group {
                Some(g) if g.is_grouped => (
                    g.group_id.clone().unwrap_or_default(),
                    g.affected_node_ids.len().to_string(),
                ),
                Some(g) => (g.group_id.clone().unwrap_or_else(|| "–".into()), "–".into()),
                None => ("–".into(), "–".into()),
            };
            writeln!(writer, "| {} | {} | {} | {} |", metric, value, group_id, affected)?;
        }
        Ok(())
    }
}

impl OutputFormatter for MarkdownOutput {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        match report {
            Report::Sankey(layout) => self.sankey(layout, writer),
            Report::Histogram(histogram) => self.histogram(histogram, writer),
            Report::Histograms(multi) => self.histograms(multi, writer),
            Report::Resolution(resolution) => self.resolution(resolution, writer),
        }
    }
}
