pub mod audio_backend;
pub mod pcm_sink;
