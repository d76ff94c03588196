use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::{ProgressData, TopicProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
}

#[derive(Debug, Serialize)]
pub struct Chapter {
    pub chapter: &'static str,
    pub topics: &'static [&'static str],
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Mathematics => "mathematics",
        }
    }

    pub fn chapters(&self) -> &'static [Chapter] {
        match self {
            Subject::Physics => PHYSICS,
            Subject::Chemistry => CHEMISTRY,
            Subject::Mathematics => MATHEMATICS,
        }
    }
}

impl TryFrom<&'_ str> for Subject {
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "mathematics" => Ok(Subject::Mathematics),
            _ => Err(()),
        }
    }
}

pub fn total_topics(chapters: &[Chapter]) -> usize {
    chapters.iter().map(|c| c.topics.len()).sum()
}

/// Ticked entries. Keys aren't checked against the catalog.
pub fn completed_topics(progress: &TopicProgress) -> usize {
    progress.values().filter(|&&done| done).count()
}

pub fn percentage(chapters: &[Chapter], progress: &TopicProgress) -> u32 {
    let total = total_topics(chapters);
    if total == 0 {
        return 0;
    }

    let completed = completed_topics(progress);
    (100.0 * completed as f64 / total as f64).round() as u32
}

pub fn subject_percentage(subject: Subject, progress: &TopicProgress) -> u32 {
    percentage(subject.chapters(), progress)
}

/// Unweighted: a short subject counts as much as a long one.
pub fn overall_percentage(physics: u32, chemistry: u32, mathematics: u32) -> u32 {
    ((physics + chemistry + mathematics) as f64 / 3.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub physics: u32,
    pub chemistry: u32,
    pub mathematics: u32,
    pub overall: u32,
}

impl Summary {
    pub fn from_progress(records: &[ProgressData]) -> Self {
        let empty = TopicProgress::new();
        let of = |subject: Subject| {
            let progress = records
                .iter()
                .find(|p| p.subject == subject)
                .map(|p| &p.topic_progress)
                .unwrap_or(&empty);

            subject_percentage(subject, progress)
        };

        let physics = of(Subject::Physics);
        let chemistry = of(Subject::Chemistry);
        let mathematics = of(Subject::Mathematics);

        Self {
            physics,
            chemistry,
            mathematics,
            overall: overall_percentage(physics, chemistry, mathematics),
        }
    }
}

pub fn catalog() -> BTreeMap<Subject, &'static [Chapter]> {
    Subject::ALL
        .into_iter()
        .map(|subject| (subject, subject.chapters()))
        .collect()
}

macro_rules! chapters {
    ($($chapter: expr => [$($topic: expr),* $(,)?]),* $(,)?) => {
        &[
            $(Chapter { chapter: $chapter, topics: &[$($topic),*] }),*
        ]
    };
}

static PHYSICS: &[Chapter] = chapters![
    "Physical World & Measurement" => ["Physical World", "Units and Measurements", "Accuracy and Precision", "Significant Figures"],
    "Kinematics" => ["Scalar and Vector Quantities", "Motion in a Straight Line", "Motion in a Plane", "Relative Velocity", "Projectile Motion"],
    "Laws of Motion" => ["Newton's Laws", "Free Body Diagrams", "Friction", "Circular Motion"],
    "Work, Energy, and Power" => ["Work and Kinetic Energy Theorem", "Power", "Conservative and Non-Conservative Forces", "Potential Energy"],
    "System of Particles and Rotational Motion" => ["Centre of Mass", "Torque and Angular Momentum", "Moment of Inertia", "Rolling Motion"],
    "Gravitation" => ["Universal Law of Gravitation", "Acceleration due to Gravity", "Satellite Motion", "Kepler's Laws"],
    "Mechanical Properties of Solids" => ["Stress and Strain", "Hooke's Law", "Young's Modulus"],
    "Mechanical Properties of Fluids" => ["Pressure and Pascal's Law", "Buoyancy", "Bernoulli's Theorem", "Viscosity"],
    "Thermal Properties of Matter" => ["Heat and Temperature", "Thermal Expansion", "Calorimetry", "Newton's Law of Cooling"],
    "Thermodynamics" => ["Zeroth and First Law", "Internal Energy", "Second Law", "Carnot Engine"],
    "Kinetic Theory of Gases" => ["Assumptions", "Pressure of an Ideal Gas", "RMS Velocity"],
    "Oscillations" => ["SHM", "Damped and Forced Oscillations", "Resonance"],
    "Waves" => ["Types of Waves", "Wave Equation", "Sound Waves", "Doppler Effect"],
];

static CHEMISTRY: &[Chapter] = chapters![
    "Some Basic Concepts of Chemistry" => ["Mole Concept", "Empirical and Molecular Formula", "Stoichiometry"],
    "Structure of Atom" => ["Bohr's Model", "Quantum Numbers", "Orbitals", "Electronic Configuration"],
    "Classification of Elements & Periodicity" => ["Modern Periodic Law", "Periodic Trends"],
    "Chemical Bonding and Molecular Structure" => ["Lewis Structures", "VSEPR Theory", "Hybridization", "Molecular Orbital Theory"],
    "States of Matter: Gases and Liquids" => ["Gas Laws", "Ideal Gas Equation", "Kinetic Molecular Theory"],
    "Thermodynamics" => ["System and Surroundings", "Enthalpy", "First Law of Thermodynamics", "Hess's Law"],
    "Equilibrium" => ["Law of Mass Action", "Le Chatelier's Principle", "Ionic Equilibrium"],
    "Redox Reactions" => ["Oxidation Number", "Balancing Redox Reactions"],
    "Hydrogen" => ["Position in Periodic Table", "Properties", "Uses"],
    "The s-Block Element" => ["Group 1 and 2 Elements", "Properties and Trends", "Important Compounds"],
    "Some p-Block Elements" => ["Group 13 and 14", "Properties and Uses"],
    "Organic Chemistry: Basic Principles and Techniques" => ["IUPAC Nomenclature", "Reaction Mechanisms", "Electron Displacement Effects"],
    "Hydrocarbons" => ["Alkanes, Alkenes, Alkynes", "Aromatic Hydrocarbons", "Reactions and Mechanisms"],
    "Environmental Chemistry" => ["Atmospheric Pollution", "Water Pollution", "Green Chemistry"],
];

static MATHEMATICS: &[Chapter] = chapters![
    "Sets" => ["Types of Sets", "Venn Diagrams", "Operations on Sets"],
    "Relations and Functions" => ["Cartesian Product", "Types of Relations", "Functions and Graphs"],
    "Trigonometric Functions" => ["Trigonometric Identities", "Graphs", "General Solutions"],
    "Principle of Mathematical Induction" => ["Basics of Induction", "Simple Proofs"],
    "Complex Numbers and Quadratic Equations" => ["Argand Plane", "Modulus and Argument", "Solving Quadratic Equations"],
    "Linear Inequalities" => ["Solutions in One Variable", "Solutions in Two Variables"],
    "Permutations and Combinations" => ["Fundamental Principle of Counting", "Factorials", "Circular Permutations"],
    "Binomial Theorem" => ["Binomial Expansion", "General Term", "Middle Term"],
    "Sequences and Series" => ["Arithmetic and Geometric Progressions", "Sum of n Terms", "Special Series"],
    "Straight Lines" => ["Slope", "Equation of Line", "Angle Between Lines"],
    "Conic Sections" => ["Parabola", "Ellipse", "Hyperbola"],
    "Introduction to 3D Geometry" => ["Direction Cosines and Ratios", "Equation of a Line"],
    "Limits and Derivatives" => ["Limits of Polynomials", "Derivatives (Basics)", "First Principle"],
    "Mathematical Reasoning" => ["Statements and Logical Operations", "Truth Tables"],
    "Statistics" => ["Mean, Median, Mode", "Standard Deviation"],
    "Probability" => ["Classical Definition", "Complementary Events", "Independent Events"],
];
