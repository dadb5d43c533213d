// formats
pub const JSON: &str = "json";
pub const FASTQ_GZ: &str = "fastq.gz";

// config pub const keys
pub const SAMPLES: &str = "samples";
pub const CONDITIONS: &str = "conditions";
pub const ANNOTATIONS: &str = "annotations";
pub const WORK: &str = "work";
pub const SCRATCH: &str = "scratch";
pub const NAIVE: &str = "naive";
pub const THREADS: &str = "threads";
pub const MEMORY: &str = "memory";
pub const QUEUE: &str = "queue";
pub const LABEL: &str = "label";
pub const WORKDIR: &str = "workdir";

// directory roles
pub const FASTQ: &str = "fastq";
pub const ALIGNMENT: &str = "alignment";
pub const BAM_SORT: &str = "bam_sort";
pub const OUT: &str = "out";

// project-wide pub const | names
pub const RNAPIPE: &str = "rnapipe";
pub const SALMON: &str = "salmon";
pub const STAR: &str = "star";
pub const SAMTOOLS: &str = "samtools";
pub const QORTS: &str = "qorts";
pub const STRINGTIE: &str = "stringtie";
pub const DRIMSEQ: &str = "drimseq";
pub const BARCODE: &str = "barcode";
pub const JAVA: &str = "java";

// reference keys
pub const SALMON_INDEX: &str = "salmon_quasi";
pub const GTF: &str = "gtf";

// placeholders
pub const SAMPLE: &str = "sample";
pub const GROUP: &str = "group";
pub const KEY: &str = "key";
pub const READ: &str = "read";
pub const CONDITION: &str = "condition";

// filenames
pub const QUANT_SF: &str = "quant.sf";
pub const ALIGNED_BAM: &str = "Aligned.out.bam";
pub const SJ_TAB: &str = "SJ.out.tab";
pub const SORTED_BAM: &str = ".sortedByCoord.bam";
pub const BAI: &str = ".bai";
pub const QORTS_SUFFIX: &str = "_qorts";
pub const STRINGTIE_GTF: &str = "_stringTie.gtf";
pub const DRIMSEQ_COEF: &str = "drimseq_coef";
pub const RDATA: &str = "RData";
pub const JOBLIST: &str = "jobs";
pub const RUN_SCRIPT: &str = "run.sh";

// defaults
pub const DEFAULT_SALMON_THREADS: i64 = 24;
pub const DEFAULT_SALMON_BOOTSTRAPS: i64 = 100;
pub const DEFAULT_STAR_THREADS: i64 = 24;
pub const DEFAULT_SORT_MEMORY: &str = "8G";
pub const DEFAULT_QORTS_HEAP: &str = "16G";
pub const DEFAULT_STRINGTIE_THREADS: i64 = 8;
pub const DEFAULT_DRIMSEQ_LABEL: &str = "salmon.no_testis";
pub const DEFAULT_QUEUE: &str = "short";
pub const DEFAULT_MEMORY_MB: i64 = 16000;

// collections
pub const READS: &[&str] = &["1", "2"];
pub const QORTS_OUTPUTS: &[&str] = &[
    "QC.geneCounts.formatted.for.DESeq.txt.gz",
    "QC.exonCounts.formatted.for.DEXSeq.txt.gz",
    "QC.spliceJunctionAndExonCounts.forJunctionSeq.txt.gz",
    "QC.spliceJunctionCounts.novelSplices.txt.gz",
    "QC.spliceJunctionCounts.knownSplices.txt.gz",
];
