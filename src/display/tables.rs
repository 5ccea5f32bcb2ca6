//! Table formatting for clustering, gap and search results.

use std::fmt;

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::service::{ClusteringReport, GapReport, SearchReport};
use crate::types::{Cluster, SearchHit};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Add a row of pre-styled cells.
    pub fn add_cells(mut self, cells: Vec<Cell>) -> Self {
        self.table.add_row(cells);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn similarity_cell(similarity: f32) -> Cell {
    let color = if similarity >= 0.85 {
        Color::Green
    } else if similarity >= 0.7 {
        Color::Yellow
    } else {
        Color::Reset
    };
    Cell::new(format!("{similarity:.3}")).fg(color)
}

/// Table of clusters: id, label, size, cohesion, centre and keywords.
pub fn create_cluster_table(clusters: &[Cluster]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "ID", "Name", "Size", "Cohesion", "Central", "Keywords", "Color",
    ]);

    for cluster in clusters {
        builder = builder.add_cells(vec![
            Cell::new(cluster.id),
            Cell::new(cluster.label()).add_attribute(Attribute::Bold),
            Cell::new(cluster.len()),
            similarity_cell(cluster.avg_internal_similarity),
            Cell::new(
                cluster
                    .central_id
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
            ),
            Cell::new(cluster.keywords.join(", ")),
            Cell::new(&cluster.color),
        ]);
    }

    builder.build()
}

/// Table of gap candidates in rank order.
pub fn create_gap_table(report: &GapReport) -> String {
    let mut builder =
        TableBuilder::new().set_headers(vec!["#", "Article A", "Article B", "Similarity", "Reason"]);

    for (rank, gap) in report.gaps.iter().enumerate() {
        builder = builder.add_cells(vec![
            Cell::new(rank + 1),
            Cell::new(&gap.id_a),
            Cell::new(&gap.id_b),
            similarity_cell(gap.similarity),
            Cell::new(&gap.reason),
        ]);
    }

    builder.build()
}

fn hit_rows(builder: TableBuilder, hits: &[SearchHit]) -> TableBuilder {
    hits.iter().fold(builder, |builder, hit| {
        builder.add_cells(vec![Cell::new(&hit.id), similarity_cell(hit.similarity)])
    })
}

/// One table per cluster group, in group order.
pub fn create_search_tables(report: &SearchReport) -> String {
    report
        .groups
        .iter()
        .map(|group| {
            let title = match group.cluster_id {
                Some(id) => format!("Cluster {id}"),
                None => "Unclustered".to_string(),
            };
            let builder = TableBuilder::new().set_headers(vec![title.as_str(), "Similarity"]);
            hit_rows(builder, &group.hits).build()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} articles, cohesion {:.3})",
            self.id,
            self.label(),
            self.len(),
            self.avg_internal_similarity
        )?;
        if !self.keywords.is_empty() {
            write!(f, " - {}", self.keywords.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for ClusteringReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scope '{}': {} clusters from {} articles ({} unassigned)",
            self.scope,
            self.clusters.len(),
            self.article_count,
            self.unassigned_ids.len()
        )?;
        if self.k_was_reduced() {
            writeln!(
                f,
                "Requested {} clusters; the data supports at most {}",
                self.requested_k, self.attempted_k()
            )?;
        }
        if !self.converged {
            writeln!(
                f,
                "Stopped after {} iterations without converging",
                self.iterations
            )?;
        }
        if !self.clusters.is_empty() {
            write!(f, "{}", create_cluster_table(&self.clusters))?;
        }
        Ok(())
    }
}

impl fmt::Display for GapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gaps.is_empty() {
            return write!(
                f,
                "No uncited pairs above similarity {:.2} in scope '{}'",
                self.threshold, self.scope
            );
        }
        writeln!(
            f,
            "{} uncited pairs above similarity {:.2} in scope '{}'",
            self.gaps.len(),
            self.threshold,
            self.scope
        )?;
        write!(f, "{}", create_gap_table(self))
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits.is_empty() {
            return write!(f, "No articles match '{}'", self.query);
        }
        writeln!(
            f,
            "{} articles match '{}' across {} groups",
            self.hits.len(),
            self.query,
            self.groups.len()
        )?;
        write!(f, "{}", create_search_tables(self))
    }
}
