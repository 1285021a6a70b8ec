//! Debug exports of graph contents as sequence records

use crate::error::Result;
use crate::graph::node::Node;
use crate::graph::DeBruijnGraph;
use crate::io::fasta::FastaWriter;

/// Read starts of a node as `read:offset:ori`, sorted by offset
fn read_starts(node: &Node) -> String {
    if node.read_starts.is_empty() {
        return ".".to_string();
    }
    let mut starts: Vec<_> = node.read_starts.iter().collect();
    starts.sort_by_key(|rs| (rs.offset, rs.read_id));
    starts
        .iter()
        .map(|rs| format!("{}:{}:{}", rs.read_id, rs.offset, rs.ori))
        .collect::<Vec<_>>()
        .join(",")
}

impl DeBruijnGraph {
    fn record_prefix(&self) -> String {
        format!("{}:{}-{}_k{}", self.reference.chrom, self.reference.start, self.reference.end, self.k)
    }

    /// Write every live node of `comp` (all components when `None`) as a record
    pub fn write_contigs(&self, comp: Option<usize>, writer: &mut FastaWriter) -> Result<usize> {
        let prefix = self.record_prefix();
        let mut written = 0;
        for id in self.sorted_ids(comp) {
            let node = &self.nodes[&id];
            if node.dead || node.is_special() {
                continue;
            }
            let header = format!(
                "{}_{} len={} cov={:.1} tumor={} normal={} ref={} reads={} starts={}",
                prefix,
                written,
                node.strlen(),
                node.tot_cov(),
                node.is_tumor,
                node.is_normal,
                node.touch_ref,
                node.reads.len(),
                read_starts(node)
            );
            writer.write_record(&header, &node.seq)?;
            written += 1;
        }
        Ok(written)
    }

    /// Write the sequence spelled by every edge, each pair once
    pub fn write_pairs(&self, comp: Option<usize>, writer: &mut FastaWriter) -> Result<usize> {
        let prefix = self.record_prefix();
        let overlap = self.k.saturating_sub(1);
        let mut written = 0;
        for id in self.sorted_ids(comp) {
            let node = &self.nodes[&id];
            if node.dead || node.is_special() {
                continue;
            }
            for edge in &node.edges {
                let Some(other) = self.node(&edge.node_id) else { continue };
                if other.is_special() || edge.node_id < id {
                    continue;
                }
                let left = node.oriented_seq(edge.dir.start());
                let right = other.oriented_seq(edge.dir.dest());
                let seq = format!("{}{}", left, right.get(overlap..).unwrap_or_default());
                let header = format!("{}_pair{} {}:{} {}", prefix, written, node.id, other.id, edge.dir);
                writer.write_record(&header, &seq)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyConfig;
    use crate::graph::{ReadInfo, ReadLabel, Strand};
    use crate::reference::ReferenceWindow;

    #[test]
    fn test_contigs_and_pairs_are_written() {
        let reference = "ACGGTCATTGCAGGA";
        let config = AssemblyConfig { k: 5, min_k: 5, cov_threshold: 1, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, reference));
        let qv = "I".repeat(reference.len());
        g.add_alignment(ReadInfo::new("r0", reference, &qv, ReadLabel::Normal, Strand::Fwd, 0));
        g.build_graph();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contigs.fa");
        let mut writer = FastaWriter::create(&path).unwrap();
        assert_eq!(g.write_contigs(None, &mut writer).unwrap(), 11);
        assert_eq!(g.write_pairs(None, &mut writer).unwrap(), 10);
        writer.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with('>')).count(), 21);
        assert!(text.lines().filter(|l| !l.starts_with('>')).any(|l| l.len() == 6));

        // the read enters the graph at its first k-mer only
        let with_start: Vec<&str> = text.lines().filter(|l| l.contains("reads=1 starts=0:")).collect();
        assert_eq!(with_start.len(), 1);
        assert!(with_start[0].contains(" len=5 "));
    }

    #[test]
    fn test_compressed_contig_keeps_read_starts() {
        let reference = "ACGGTCATTGCAGGA";
        let config = AssemblyConfig { k: 5, min_k: 5, cov_threshold: 1, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, reference));
        let qv = "I".repeat(reference.len());
        g.add_alignment(ReadInfo::new("r0", reference, &qv, ReadLabel::Normal, Strand::Fwd, 0));
        g.add_alignment(ReadInfo::new("r1", &reference[3..], &qv[3..], ReadLabel::Normal, Strand::Fwd, 0));
        g.build_graph();
        g.mark_ref_nodes();
        g.mark_connected_components();
        g.compress(1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contigs.fa");
        let mut writer = FastaWriter::create(&path).unwrap();
        assert_eq!(g.write_contigs(None, &mut writer).unwrap(), 1);
        writer.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.contains("len=15"));
        assert!(header.contains("reads=2 starts="));
    }
}
