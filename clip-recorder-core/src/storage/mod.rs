pub mod wav_file;
