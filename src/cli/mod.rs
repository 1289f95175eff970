//! CLI Module
//!
//! Command-line interface for running booth sessions without a web front end.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::session::{Layout, Orientation};

/// Snapbooth - photo-booth sessions and collages from the terminal
#[derive(Parser, Debug)]
#[command(name = "snapbooth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how many photos each layout captures and keeps
    #[command(name = "limits")]
    Limits,

    /// Run a full capture → select → finalize session
    #[command(name = "session")]
    Session {
        /// Collage layout: double, quad or strip
        #[arg(short, long, default_value = "double")]
        layout: Layout,

        /// Collage orientation: portrait or landscape
        #[arg(short, long, default_value = "portrait")]
        orientation: Orientation,

        /// Photo indices to keep, comma separated (defaults to the first ones)
        #[arg(short, long, value_delimiter = ',')]
        select: Option<Vec<usize>>,

        /// Directory of images to use as camera frames (synthetic frames otherwise)
        #[arg(short, long)]
        frames: Option<PathBuf>,
    },

    /// Compose image files straight into a collage
    #[command(name = "compose")]
    Compose {
        /// Input images, in collage order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, default_value = "double")]
        layout: Layout,

        #[arg(short, long, default_value = "portrait")]
        orientation: Orientation,

        /// Where to write the JPEG
        #[arg(long)]
        out: PathBuf,
    },

    /// List saved collages, newest first
    #[command(name = "list")]
    List,
}
