use std::{collections::BTreeSet, fs, path::Path};

use super::*;
use crate::{
    platform::{Platform, ToolTable},
    seq::fasta::read_fasta_file,
    tree::Split,
};

const FASTA: &str = "tests/data/aligned.fas";
const CLUSTAL: &str = "tests/data/aligned.aln";

fn expected_splits() -> BTreeSet<Split> {
    let split = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Split>();
    [split(&["C", "D", "E"]), split(&["D", "E"])].into_iter().collect()
}

fn nj(path: &Path, format: AlignmentFormat) -> Result<TreeNode, PipelineError> {
    distance_tree(path, format, DistanceMethod::NeighborJoining)
}

fn upgma_tree(path: &Path, format: AlignmentFormat) -> Result<TreeNode, PipelineError> {
    distance_tree(path, format, DistanceMethod::Upgma)
}

#[test]
fn nj_from_fasta_and_clustal_agree() {
    let from_fasta = nj(Path::new(FASTA), AlignmentFormat::FastA).unwrap();
    let from_clustal = nj(Path::new(CLUSTAL), AlignmentFormat::Clustal).unwrap();
    assert_eq!(from_fasta.to_newick(), from_clustal.to_newick());
    assert_eq!(from_fasta.splits(), expected_splits());
}

#[test]
fn record_order_does_not_change_topology() {
    let dir = tempfile::tempdir().unwrap();
    let records = read_fasta_file(FASTA).unwrap();
    let orders: [[usize; 5]; 3] = [[4, 3, 2, 1, 0], [2, 0, 4, 1, 3], [1, 3, 0, 4, 2]];
    for (n, order) in orders.iter().enumerate() {
        let path = dir.path().join(format!("perm{}.fas", n));
        let text: String = order
            .iter()
            .map(|&i| format!(">{}\n{}\n", records[i].header, records[i].sequence))
            .collect();
        fs::write(&path, text).unwrap();
        let tree = nj(&path, AlignmentFormat::FastA).unwrap();
        assert_eq!(tree.splits(), expected_splits(), "order {:?}", order);
    }
}

#[test]
fn rerun_gives_same_newick() {
    let first = upgma_tree(Path::new(FASTA), AlignmentFormat::FastA).unwrap();
    let second = upgma_tree(Path::new(FASTA), AlignmentFormat::FastA).unwrap();
    assert_eq!(first.to_newick(), second.to_newick());
    assert_eq!(first.leaf_count(), 5);
}

#[test]
fn tree_is_ladderized() {
    let tree = nj(Path::new(FASTA), AlignmentFormat::FastA).unwrap();
    let mut stack = vec![&tree];
    while let Some(node) = stack.pop() {
        let counts: Vec<usize> = node.children.iter().map(TreeNode::leaf_count).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        stack.extend(node.children.iter());
    }
}

#[test]
fn mismatched_format_tag() {
    let err = nj(Path::new(FASTA), AlignmentFormat::Clustal).unwrap_err();
    assert!(matches!(err, PipelineError::Format(_)), "{}", err);
    let err = nj(Path::new(CLUSTAL), AlignmentFormat::FastA).unwrap_err();
    assert!(matches!(err, PipelineError::Format(_)), "{}", err);
}

#[test]
fn unaligned_input_rejected() {
    let err = distance_tree(
        Path::new("tests/data/unaligned.fas"),
        AlignmentFormat::FastA,
        DistanceMethod::NeighborJoining,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Format(_)));
}

#[test]
fn missing_alignment_is_io_error() {
    let err = distance_tree(
        Path::new("tests/data/no-such-file.aln"),
        AlignmentFormat::Clustal,
        DistanceMethod::NeighborJoining,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn phyml_tree_path_convention() {
    assert_eq!(
        phyml_tree_path(Path::new("work/msa_muscle.phylip")),
        PathBuf::from("work/msa_muscle.phylip_phyml_tree.txt")
    );
}

#[test]
fn likelihood_unknown_platform_fails_first() {
    let dir = tempfile::tempdir().unwrap();
    let phylip = dir.path().join("out.phylip");
    let err = likelihood_tree(
        &ToolsConfig::default(),
        "amigaos",
        Path::new(FASTA),
        AlignmentFormat::FastA,
        &phylip,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!phylip.exists());
}

#[cfg(unix)]
fn fake_phyml(dir: &Path, tree: &str) -> ToolsConfig {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-phyml");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\n[ \"$1\" = \"-i\" ] || exit 2\n\
             printf '%s\\n' '{}' > \"$2_phyml_tree.txt\"\n",
            tree
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let path = script.to_string_lossy().into_owned();
    ToolsConfig {
        phyml: ToolTable::new(&[
            (Platform::Darwin, path.as_str()),
            (Platform::Linux, path.as_str()),
            (Platform::Win32, path.as_str()),
        ]),
        ..ToolsConfig::default()
    }
}

#[cfg(unix)]
#[test]
fn likelihood_tree_with_fake_phyml() {
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_phyml(dir.path(), "((A:0.1,B:0.1)0.9:0.2,C:0.3,(D:0.1,E:0.2)0.8:0.1);");
    let phylip = dir.path().join("msa_muscle.phylip");
    let tree = likelihood_tree(
        &tools,
        "linux",
        Path::new(CLUSTAL),
        AlignmentFormat::Clustal,
        &phylip,
    )
    .unwrap();
    assert_eq!(tree.leaf_names(), vec!["A", "B", "C", "D", "E"]);
    let phylip_text = fs::read_to_string(&phylip).unwrap();
    assert!(phylip_text.starts_with(" 5 30\n"));
}

#[cfg(unix)]
#[test]
fn likelihood_tree_garbage_output() {
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_phyml(dir.path(), "((A,B");
    let phylip = dir.path().join("x.phylip");
    let err = likelihood_tree(
        &tools,
        "darwin",
        Path::new(FASTA),
        AlignmentFormat::FastA,
        &phylip,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Format(_)));
}
