use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str = "\
usage: encore [DIR]                    play every audio file under DIR (default: .)
       encore --playlist NAME          play a saved playlist
       encore --export NAME FILE.m3u   write a saved playlist as M3U and exit
       encore --list                   list saved playlists
       encore --create NAME            create an empty playlist
       encore --delete NAME            delete a playlist
       encore --help";

/// Where the catalog for a session comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Directory(PathBuf),
    Playlist(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(Source),
    Export { playlist: String, out: PathBuf },
    List,
    Create(String),
    Delete(String),
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("{0} expects {1}")]
    MissingValue(&'static str, &'static str),
    #[error("unknown option {0}")]
    UnknownOption(String),
    #[error("unexpected argument {0}")]
    Unexpected(String),
}

/// Parse the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(first) = args.next() else {
        return Ok(Command::Play(Source::Directory(PathBuf::from("."))));
    };

    let command = match first.as_str() {
        "-h" | "--help" => return Ok(Command::Help),
        "--playlist" => {
            let name = args
                .next()
                .ok_or(UsageError::MissingValue("--playlist", "a playlist name"))?;
            Command::Play(Source::Playlist(name))
        }
        "--export" => {
            let playlist = args
                .next()
                .ok_or(UsageError::MissingValue("--export", "a playlist name and a file"))?;
            let out = args
                .next()
                .ok_or(UsageError::MissingValue("--export", "a playlist name and a file"))?;
            Command::Export {
                playlist,
                out: PathBuf::from(out),
            }
        }
        "--list" => Command::List,
        "--create" => Command::Create(
            args.next()
                .ok_or(UsageError::MissingValue("--create", "a playlist name"))?,
        ),
        "--delete" => Command::Delete(
            args.next()
                .ok_or(UsageError::MissingValue("--delete", "a playlist name"))?,
        ),
        opt if opt.starts_with('-') => return Err(UsageError::UnknownOption(opt.to_string())),
        dir => Command::Play(Source::Directory(PathBuf::from(dir))),
    };

    match args.next() {
        Some(extra) => Err(UsageError::Unexpected(extra)),
        None => Ok(command),
    }
}
